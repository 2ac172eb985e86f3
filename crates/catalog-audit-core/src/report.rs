use serde::Serialize;

use crate::engine::AuditOutcome;
use crate::reconcile::{Category, Severity, ValidationIssue};
use crate::scanner::FetchFailure;

/// Aggregate numbers for the report header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub filesystem_directories: usize,
    pub catalog_directories: usize,
    pub matched: usize,
    pub filesystem_images: usize,
    pub catalog_images: usize,
    pub filesystem_videos: usize,
    pub catalog_videos: usize,
    pub total_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub fetch_failures: usize,
}

impl AuditSummary {
    pub fn from_outcome(outcome: &AuditOutcome) -> Self {
        Self {
            filesystem_directories: outcome.filesystem.record_count(),
            catalog_directories: outcome.catalog.len(),
            matched: outcome.matches.len(),
            filesystem_images: outcome.filesystem.total_images(),
            catalog_images: outcome.catalog.total_images(),
            filesystem_videos: outcome.filesystem.total_videos(),
            catalog_videos: outcome.catalog.total_videos(),
            total_issues: outcome.issues.len(),
            errors: outcome.count(Severity::Error),
            warnings: outcome.count(Severity::Warning),
            infos: outcome.count(Severity::Info),
            fetch_failures: outcome.fetch_failures.len(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.total_issues == 0 {
            Verdict::Clean
        } else {
            Verdict::Findings {
                errors: self.errors,
                warnings: self.warnings,
                infos: self.infos,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    Findings {
        errors: usize,
        warnings: usize,
        infos: usize,
    },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        match self {
            Verdict::Clean => true,
            Verdict::Findings { errors, .. } => *errors == 0,
        }
    }
}

/// Issues grouped by category in rule order, each group in emission order.
pub fn group_by_category(issues: &[ValidationIssue]) -> Vec<(Category, Vec<&ValidationIssue>)> {
    Category::ALL
        .iter()
        .filter_map(|category| {
            let group: Vec<&ValidationIssue> =
                issues.iter().filter(|i| i.category == *category).collect();
            (!group.is_empty()).then_some((*category, group))
        })
        .collect()
}

/// Operator follow-ups derived from the findings.
pub fn recommendations(outcome: &AuditOutcome) -> Vec<String> {
    let errors = |category: Category| {
        outcome
            .issues
            .iter()
            .filter(|i| i.category == category && i.severity == Severity::Error)
            .count()
    };

    let mut out = Vec::new();
    let missing = errors(Category::MissingEntry);
    if missing > 0 {
        out.push(format!(
            "{} directories need to be scanned into the catalog",
            missing
        ));
    }
    let counts = errors(Category::CountMismatch);
    if counts > 0 {
        out.push(format!(
            "{} collections have count discrepancies; re-run the scanner to update image/video counts",
            counts
        ));
    }
    let orphaned = errors(Category::OrphanedEntry);
    if orphaned > 0 {
        out.push(format!(
            "{} database entries may be stale; review and remove them if their directories were deleted",
            orphaned
        ));
    }
    let hints = outcome
        .issues
        .iter()
        .filter(|i| {
            matches!(
                &i.details,
                crate::reconcile::IssueDetails::Missing {
                    possible_match: Some(_),
                    ..
                }
            )
        })
        .count();
    if hints > 0 {
        out.push(format!(
            "{} missing directories look like renamed catalog entries; check their possible_match",
            hints
        ));
    }
    if !outcome.fetch_failures.is_empty() {
        out.push(format!(
            "{} sub-collections could not be fetched; re-run once the catalog is healthy",
            outcome.fetch_failures.len()
        ));
    }
    out
}

/// Serializable form of a finished audit.
#[derive(Debug, Serialize)]
pub struct AuditReport<'a> {
    pub summary: AuditSummary,
    pub verdict: Verdict,
    pub issues: &'a [ValidationIssue],
    pub fetch_failures: &'a [FetchFailure],
    pub recommendations: Vec<String>,
}

impl<'a> AuditReport<'a> {
    pub fn new(outcome: &'a AuditOutcome) -> Self {
        let summary = outcome.summary();
        Self {
            verdict: summary.verdict(),
            summary,
            issues: &outcome.issues,
            fetch_failures: &outcome.fetch_failures,
            recommendations: recommendations(outcome),
        }
    }
}
