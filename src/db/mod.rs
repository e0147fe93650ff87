pub mod connection;
pub mod local_storage;
