pub mod analysis;
pub mod board;
pub mod browse;
pub mod export;
pub mod history;
pub mod import;
pub mod migrate;
pub mod report;
pub mod summary;
pub mod toast;
