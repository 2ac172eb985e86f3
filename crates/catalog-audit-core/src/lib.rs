pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod scanner;
pub mod slug;

pub use config::AuditConfig;
pub use engine::{AuditEngine, AuditOutcome, Stage};
pub use error::Error;
pub use model::{DirectoryRecord, RecordMap};
pub use progress::{ProgressReporter, SilentReporter};
pub use reconcile::{Category, Severity, ValidationIssue};
