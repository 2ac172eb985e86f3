use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::catalog::{CatalogClient, HttpCatalogClient};
use crate::config::AuditConfig;
use crate::error::Error;
use crate::model::RecordMap;
use crate::progress::ProgressReporter;
use crate::reconcile::{default_rules, run_rules, MatchTable, Rule, RuleContext, Severity, ValidationIssue};
use crate::report::AuditSummary;
use crate::scanner::{CatalogScan, CatalogScanner, FetchFailure, FilesystemScanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    ScanFilesystem,
    ScanCatalog,
    BuildMatchTable,
    RunRules,
    Done,
    Aborted,
}

impl Stage {
    pub fn describe(&self) -> &'static str {
        match self {
            Stage::ScanFilesystem => "Scanning filesystem",
            Stage::ScanCatalog => "Scanning catalog",
            Stage::BuildMatchTable => "Building slug matches",
            Stage::RunRules => "Running validation checks",
            Stage::Done => "Done",
            Stage::Aborted => "Aborted",
        }
    }
}

pub struct AuditEngine {
    config: AuditConfig,
    client: Box<dyn CatalogClient>,
    rules: Vec<Box<dyn Rule>>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct AuditTimings {
    pub filesystem: Duration,
    pub catalog: Duration,
    pub reconcile: Duration,
}

/// Everything one reconciliation pass produced.
#[derive(Debug)]
pub struct AuditOutcome {
    pub filesystem: RecordMap,
    pub catalog: RecordMap,
    pub matches: MatchTable,
    pub issues: Vec<ValidationIssue>,
    pub fetch_failures: Vec<FetchFailure>,
    pub timings: AuditTimings,
}

impl AuditOutcome {
    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_outcome(self)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl AuditEngine {
    /// Engine talking to the configured HTTP catalog.
    pub fn new(config: AuditConfig) -> Result<Self, Error> {
        let client = HttpCatalogClient::new(&config)?;
        Ok(Self::with_client(config, Box::new(client)))
    }

    pub fn with_client(config: AuditConfig, client: Box<dyn CatalogClient>) -> Self {
        Self {
            config,
            client,
            rules: default_rules(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<Box<dyn Rule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn scan_filesystem(&self, reporter: &dyn ProgressReporter) -> Result<RecordMap, Error> {
        reporter.on_stage_start(Stage::ScanFilesystem);
        info!("Scanning filesystem: {}", self.config.content_root.display());
        let start = Instant::now();
        let map = FilesystemScanner::from_config(&self.config).scan(reporter)?;
        let elapsed = start.elapsed().as_secs_f64();
        info!("Found {} directories in {:.2}s", map.record_count(), elapsed);
        reporter.on_filesystem_complete(map.record_count(), elapsed);
        Ok(map)
    }

    pub fn scan_catalog(&self, reporter: &dyn ProgressReporter) -> Result<CatalogScan, Error> {
        reporter.on_stage_start(Stage::ScanCatalog);
        info!("Scanning catalog via API: {}", self.client.location());
        let start = Instant::now();
        let scan = CatalogScanner::new(self.client.as_ref(), self.config.max_concurrent_fetches)
            .scan(reporter)?;
        let elapsed = start.elapsed().as_secs_f64();
        reporter.on_catalog_complete(scan.records.len(), scan.failures.len(), elapsed);
        Ok(scan)
    }

    /// Run the full pipeline:
    /// 1. Scan filesystem and catalog concurrently
    /// 2. Pair filesystem keys with catalog slugs
    /// 3. Run the rule battery
    ///
    /// A fatal scan error aborts before any rule runs.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<AuditOutcome, Error> {
        let (filesystem, catalog) = rayon::join(
            || {
                let start = Instant::now();
                self.scan_filesystem(reporter).map(|map| (map, start.elapsed()))
            },
            || {
                let start = Instant::now();
                self.scan_catalog(reporter).map(|scan| (scan, start.elapsed()))
            },
        );

        let (filesystem, fs_duration) = filesystem.map_err(|err| self.abort(reporter, err))?;
        let (catalog, catalog_duration) = catalog.map_err(|err| self.abort(reporter, err))?;

        let reconcile_start = Instant::now();
        reporter.on_stage_start(Stage::BuildMatchTable);
        let matches = MatchTable::build(&filesystem, &catalog.records);
        reporter.on_match_complete(matches.len(), filesystem.len());

        reporter.on_stage_start(Stage::RunRules);
        let ctx = RuleContext::new(&filesystem, &catalog.records, &matches);
        let issues = run_rules(&self.rules, &ctx);
        let reconcile_duration = reconcile_start.elapsed();
        debug!(
            "Reconciliation completed in {:.2}s with {} issues",
            reconcile_duration.as_secs_f64(),
            issues.len()
        );
        reporter.on_rules_complete(issues.len(), reconcile_duration.as_secs_f64());
        reporter.on_stage_start(Stage::Done);

        Ok(AuditOutcome {
            filesystem,
            catalog: catalog.records,
            matches,
            issues,
            fetch_failures: catalog.failures,
            timings: AuditTimings {
                filesystem: fs_duration,
                catalog: catalog_duration,
                reconcile: reconcile_duration,
            },
        })
    }

    fn abort(&self, reporter: &dyn ProgressReporter, err: Error) -> Error {
        error!("Audit aborted: {}", err);
        reporter.on_stage_start(Stage::Aborted);
        err
    }
}
