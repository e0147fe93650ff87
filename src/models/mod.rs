pub mod analysis;
pub mod id;
pub mod marker;
pub mod transaction;
pub mod user;
