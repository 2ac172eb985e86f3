pub mod catalog;
pub mod fs;

pub use catalog::{CatalogScan, CatalogScanner, FetchFailure};
pub use fs::FilesystemScanner;
