use crate::engine::Stage;

/// Trait for reporting audit progress.
///
/// The CLI implements it with indicatif spinners. All methods have default
/// no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_stage_start(&self, _stage: Stage) {}
    fn on_directory_scanned(&self, _directories_found: usize, _current_path: &str) {}
    fn on_filesystem_complete(&self, _directories: usize, _duration_secs: f64) {}
    fn on_collection_fetched(&self, _collections_fetched: usize, _slug: &str) {}
    fn on_catalog_complete(&self, _collections: usize, _failures: usize, _duration_secs: f64) {}
    fn on_match_complete(&self, _matched: usize, _filesystem_total: usize) {}
    fn on_rules_complete(&self, _issues: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
