use catalog_audit_core::{ProgressReporter, Stage};
use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif spinners.
///
/// The filesystem and catalog scans run at the same time, so each gets its
/// own spinner in a shared `MultiProgress`.
pub struct CliReporter {
    multi: MultiProgress,
    filesystem: Mutex<Option<ProgressBar>>,
    catalog: Mutex<Option<ProgressBar>>,
    reconcile: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            filesystem: Mutex::new(None),
            catalog: Mutex::new(None),
            reconcile: Mutex::new(None),
        }
    }

    fn spinner(&self, slot: &Mutex<Option<ProgressBar>>, message: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars(TICKS),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));

        let mut guard = slot.lock().unwrap();
        if let Some(old) = guard.replace(pb) {
            old.finish_and_clear();
        }
    }

    fn update(slot: &Mutex<Option<ProgressBar>>, message: String) {
        if let Some(pb) = slot.lock().unwrap().as_ref() {
            pb.set_message(message);
        }
    }

    fn finish(&self, slot: &Mutex<Option<ProgressBar>>, line: String) {
        if let Some(pb) = slot.lock().unwrap().take() {
            pb.finish_and_clear();
        }
        let _ = self.multi.println(format!("  {} {}", "✓".green(), line));
    }

    fn clear_all(&self) {
        for slot in [&self.filesystem, &self.catalog, &self.reconcile] {
            if let Some(pb) = slot.lock().unwrap().take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_stage_start(&self, stage: Stage) {
        match stage {
            Stage::ScanFilesystem => self.spinner(&self.filesystem, "Scanning filesystem..."),
            Stage::ScanCatalog => self.spinner(&self.catalog, "Scanning catalog..."),
            Stage::BuildMatchTable | Stage::RunRules => {
                self.spinner(&self.reconcile, &format!("{}...", stage.describe()))
            }
            Stage::Done => self.clear_all(),
            Stage::Aborted => {
                self.clear_all();
                let _ = self.multi.println(format!("  {} Audit aborted", "✗".red()));
            }
        }
    }

    fn on_directory_scanned(&self, directories_found: usize, _current_path: &str) {
        Self::update(
            &self.filesystem,
            format!("Scanning filesystem... {} directories found", directories_found),
        );
    }

    fn on_filesystem_complete(&self, directories: usize, duration_secs: f64) {
        self.finish(
            &self.filesystem,
            format!("Filesystem scan complete: {} directories in {:.2}s", directories, duration_secs),
        );
    }

    fn on_collection_fetched(&self, collections_fetched: usize, slug: &str) {
        Self::update(
            &self.catalog,
            format!("Scanning catalog... {} collections ({})", collections_fetched, slug),
        );
    }

    fn on_catalog_complete(&self, collections: usize, failures: usize, duration_secs: f64) {
        let mut line = format!(
            "Catalog scan complete: {} collections in {:.2}s",
            collections, duration_secs
        );
        if failures > 0 {
            line.push_str(&format!(", {}", format!("{} fetches failed", failures).yellow()));
        }
        self.finish(&self.catalog, line);
    }

    fn on_match_complete(&self, matched: usize, filesystem_total: usize) {
        Self::update(
            &self.reconcile,
            format!("Matched {} of {} directories", matched, filesystem_total),
        );
    }

    fn on_rules_complete(&self, issues: usize, duration_secs: f64) {
        self.finish(
            &self.reconcile,
            format!("Validation complete: {} issues in {:.2}s", issues, duration_secs),
        );
    }
}
