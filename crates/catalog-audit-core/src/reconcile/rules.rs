use rayon::prelude::*;
use serde_json::Value;

use super::issue::{Category, CountKind, IssueDetails, MetadataPresence, Severity, ValidationIssue};
use super::match_table::MatchTable;
use crate::model::{DirectoryRecord, RecordMap};
use crate::slug;

/// Image drift above this many files is a real desync rather than an import in flight.
pub const IMAGE_DRIFT_ERROR_THRESHOLD: i64 = 5;

/// Child collection drift tolerated before a warning is raised.
pub const CHILD_DRIFT_TOLERANCE: i64 = 1;

/// Read-only inputs shared by every rule.
pub struct RuleContext<'a> {
    pub filesystem: &'a RecordMap,
    pub catalog: &'a RecordMap,
    pub matches: &'a MatchTable,
}

/// A matched filesystem/catalog pair.
pub struct MatchedPair<'a> {
    pub filesystem_key: &'a str,
    pub filesystem: &'a DirectoryRecord,
    pub database_key: &'a str,
    pub database: &'a DirectoryRecord,
}

impl<'a> RuleContext<'a> {
    pub fn new(filesystem: &'a RecordMap, catalog: &'a RecordMap, matches: &'a MatchTable) -> Self {
        Self {
            filesystem,
            catalog,
            matches,
        }
    }

    /// Matched pairs whose catalog side was fully fetched. Counts and
    /// metadata of a partial record are placeholders and not compared.
    pub fn complete_pairs(&self) -> impl Iterator<Item = MatchedPair<'a>> + '_ {
        self.matched_pairs().filter(|pair| !pair.database.partial)
    }

    pub fn matched_pairs(&self) -> impl Iterator<Item = MatchedPair<'a>> + '_ {
        self.matches.iter().filter_map(move |(fs_key, db_key)| {
            Some(MatchedPair {
                filesystem_key: fs_key,
                filesystem: self.filesystem.get(fs_key)?,
                database_key: db_key,
                database: self.catalog.get(db_key)?,
            })
        })
    }
}

/// One independent check. Rules only read their context.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue>;
}

/// The battery in report order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(OrphanedEntries),
        Box::new(MissingEntries),
        Box::new(DuplicateSlugs),
        Box::new(ImageCountDrift),
        Box::new(VideoCountDrift),
        Box::new(ChildCountDrift),
        Box::new(MetadataDrift),
        Box::new(HierarchyDrift),
    ]
}

/// Evaluate rules in parallel; output keeps rule order.
pub fn run_rules(rules: &[Box<dyn Rule>], ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    rules
        .par_iter()
        .map(|rule| {
            let issues = rule.evaluate(ctx);
            tracing::debug!("Rule {} produced {} issues", rule.name(), issues.len());
            issues
        })
        .collect::<Vec<_>>()
        .concat()
}

pub struct OrphanedEntries;

impl Rule for OrphanedEntries {
    fn name(&self) -> &'static str {
        "orphaned-entries"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.catalog
            .iter()
            .filter(|(slug, _)| !ctx.matches.contains_database(slug))
            .map(|(slug, record)| {
                ValidationIssue::new(
                    Category::OrphanedEntry,
                    Severity::Error,
                    slug,
                    "Collection exists in database but not on filesystem",
                    IssueDetails::Orphaned {
                        parent: record.parent_identifier.clone(),
                    },
                )
            })
            .collect()
    }
}

pub struct MissingEntries;

impl MissingEntries {
    /// An unmatched catalog slug that probably names the same collection.
    fn possible_match(ctx: &RuleContext<'_>, key: &str, record: &DirectoryRecord) -> Option<String> {
        let loose_key = slug::loose_form(key);
        ctx.catalog
            .keys()
            .filter(|candidate| !ctx.matches.contains_database(candidate))
            .find(|candidate| {
                slug::loose_form(candidate) == loose_key
                    || slug::loosely_ends_with(candidate, &record.identifier)
            })
            .map(str::to_string)
    }
}

impl Rule for MissingEntries {
    fn name(&self) -> &'static str {
        "missing-entries"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.filesystem
            .iter()
            .filter(|(key, _)| !ctx.matches.contains_filesystem(key))
            .map(|(key, record)| {
                ValidationIssue::new(
                    Category::MissingEntry,
                    Severity::Error,
                    key,
                    "Directory exists on filesystem but not in database",
                    IssueDetails::Missing {
                        path: record.location.clone(),
                        parent: record.parent_identifier.clone(),
                        image_count: record.image_count,
                        video_count: record.video_count,
                        has_metadata: record.has_metadata(),
                        possible_match: Self::possible_match(ctx, key, record),
                    },
                )
            })
            .collect()
    }
}

pub struct DuplicateSlugs;

impl Rule for DuplicateSlugs {
    fn name(&self) -> &'static str {
        "duplicate-slugs"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.filesystem
            .collisions()
            .map(|(key, records)| {
                ValidationIssue::new(
                    Category::DuplicateSlug,
                    Severity::Error,
                    key,
                    format!("Slug appears {} times in filesystem", records.len()),
                    IssueDetails::Duplicate {
                        occurrences: records.len(),
                        paths: records.iter().filter_map(|r| r.location.clone()).collect(),
                    },
                )
            })
            .collect()
    }
}

fn count_issue(
    pair: &MatchedPair<'_>,
    count: CountKind,
    severity: Severity,
    message: &str,
    filesystem: usize,
    database: usize,
    note: Option<&str>,
) -> ValidationIssue {
    ValidationIssue::new(
        Category::CountMismatch,
        severity,
        pair.database_key,
        message,
        IssueDetails::Count {
            count,
            filesystem_identifier: pair.filesystem_key.to_string(),
            filesystem,
            database,
            difference: filesystem as i64 - database as i64,
            note: note.map(str::to_string),
        },
    )
}

pub struct ImageCountDrift;

impl Rule for ImageCountDrift {
    fn name(&self) -> &'static str {
        "image-count"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.complete_pairs()
            .filter(|pair| pair.filesystem.image_count != pair.database.image_count)
            .map(|pair| {
                let (fs, db) = (pair.filesystem.image_count, pair.database.image_count);
                let severity = if (fs as i64 - db as i64).abs() > IMAGE_DRIFT_ERROR_THRESHOLD {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                count_issue(
                    &pair,
                    CountKind::Images,
                    severity,
                    "Image count mismatch",
                    fs,
                    db,
                    Some("Re-run scanner to update counts"),
                )
            })
            .collect()
    }
}

pub struct VideoCountDrift;

impl Rule for VideoCountDrift {
    fn name(&self) -> &'static str {
        "video-count"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.complete_pairs()
            .filter(|pair| pair.filesystem.video_count != pair.database.video_count)
            .map(|pair| {
                let (fs, db) = (pair.filesystem.video_count, pair.database.video_count);
                // A catalog with no videos at all usually has video import switched off.
                let (severity, note) = if db == 0 {
                    (Severity::Warning, Some("Video support may not be enabled"))
                } else {
                    (Severity::Error, None)
                };
                count_issue(&pair, CountKind::Videos, severity, "Video count mismatch", fs, db, note)
            })
            .collect()
    }
}

pub struct ChildCountDrift;

impl Rule for ChildCountDrift {
    fn name(&self) -> &'static str {
        "child-count"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.complete_pairs()
            .filter(|pair| {
                let drift = pair.filesystem.child_count as i64 - pair.database.child_count as i64;
                drift.abs() > CHILD_DRIFT_TOLERANCE
            })
            .map(|pair| {
                count_issue(
                    &pair,
                    CountKind::Children,
                    Severity::Warning,
                    "Subcollection count mismatch",
                    pair.filesystem.child_count,
                    pair.database.child_count,
                    None,
                )
            })
            .collect()
    }
}

fn object_keys(value: Option<&Value>) -> Vec<String> {
    let mut keys: Vec<String> = match value {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    keys.sort();
    keys
}

pub struct MetadataDrift;

impl Rule for MetadataDrift {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.complete_pairs()
            .filter_map(|pair| {
                let fs = pair.filesystem.metadata.as_ref();
                let db = pair.database.metadata.as_ref();
                let (presence, severity, message, note) = match (fs, db) {
                    (None, None) => return None,
                    (Some(a), Some(b)) if a == b => return None,
                    (Some(_), None) => (
                        MetadataPresence::FilesystemOnly,
                        Severity::Warning,
                        "config.json exists on filesystem but not in database",
                        None,
                    ),
                    (None, Some(_)) => (
                        MetadataPresence::DatabaseOnly,
                        Severity::Info,
                        "config.json exists in database but not on filesystem",
                        Some("Database may have auto-generated config"),
                    ),
                    (Some(_), Some(_)) => (
                        MetadataPresence::Both,
                        Severity::Warning,
                        "config.json content differs between filesystem and database",
                        None,
                    ),
                };
                Some(ValidationIssue::new(
                    Category::ConfigMismatch,
                    severity,
                    pair.database_key,
                    message,
                    IssueDetails::Config {
                        presence,
                        filesystem_keys: object_keys(fs),
                        database_keys: object_keys(db),
                        note: note.map(str::to_string),
                    },
                ))
            })
            .collect()
    }
}

pub struct HierarchyDrift;

impl HierarchyDrift {
    /// The catalog slug the parent should carry: the slug the filesystem
    /// parent was matched to, else its canonical identifier.
    fn expected_parent(ctx: &RuleContext<'_>, record: &DirectoryRecord) -> Option<String> {
        record.parent_canonical_identifier().map(|parent| {
            ctx.matches
                .get(&parent)
                .map(str::to_string)
                .unwrap_or(parent)
        })
    }
}

impl Rule for HierarchyDrift {
    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        ctx.matched_pairs()
            .filter_map(|pair| {
                let expected = Self::expected_parent(ctx, pair.filesystem);
                let declared = pair.database.parent_identifier.clone();
                let same = match (&expected, &declared) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                    _ => false,
                };
                if same {
                    return None;
                }
                Some(ValidationIssue::new(
                    Category::HierarchyMismatch,
                    Severity::Error,
                    pair.database_key,
                    "Parent directory mismatch",
                    IssueDetails::Hierarchy {
                        filesystem_parent: pair.filesystem.parent_identifier.clone(),
                        database_parent: declared,
                        expected_parent: expected,
                    },
                ))
            })
            .collect()
    }
}
