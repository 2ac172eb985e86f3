use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of finding kinds, declared in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "Orphaned DB Entry")]
    OrphanedEntry,
    #[serde(rename = "Missing DB Entry")]
    MissingEntry,
    #[serde(rename = "Duplicate Slug")]
    DuplicateSlug,
    #[serde(rename = "Count Mismatch")]
    CountMismatch,
    #[serde(rename = "Config Mismatch")]
    ConfigMismatch,
    #[serde(rename = "Hierarchy Mismatch")]
    HierarchyMismatch,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::OrphanedEntry,
        Category::MissingEntry,
        Category::DuplicateSlug,
        Category::CountMismatch,
        Category::ConfigMismatch,
        Category::HierarchyMismatch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::OrphanedEntry => "Orphaned DB Entry",
            Category::MissingEntry => "Missing DB Entry",
            Category::DuplicateSlug => "Duplicate Slug",
            Category::CountMismatch => "Count Mismatch",
            Category::ConfigMismatch => "Config Mismatch",
            Category::HierarchyMismatch => "Hierarchy Mismatch",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountKind {
    Images,
    Videos,
    Children,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPresence {
    FilesystemOnly,
    DatabaseOnly,
    Both,
}

/// Per-category payload attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueDetails {
    Orphaned {
        parent: Option<String>,
    },
    Missing {
        path: Option<PathBuf>,
        parent: Option<String>,
        image_count: usize,
        video_count: usize,
        has_metadata: bool,
        /// Unmatched catalog slug that looks like the same collection.
        possible_match: Option<String>,
    },
    Duplicate {
        occurrences: usize,
        paths: Vec<PathBuf>,
    },
    Count {
        count: CountKind,
        filesystem_identifier: String,
        filesystem: usize,
        database: usize,
        difference: i64,
        note: Option<String>,
    },
    Config {
        presence: MetadataPresence,
        filesystem_keys: Vec<String>,
        database_keys: Vec<String>,
        note: Option<String>,
    },
    Hierarchy {
        filesystem_parent: Option<String>,
        database_parent: Option<String>,
        expected_parent: Option<String>,
    },
}

impl IssueDetails {
    /// Flattened `key: value` pairs for line-oriented output. Absent values are omitted.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        match self {
            IssueDetails::Orphaned { parent } => push_opt(&mut out, "parent", parent),
            IssueDetails::Missing {
                path,
                parent,
                image_count,
                video_count,
                has_metadata,
                possible_match,
            } => {
                push_opt(&mut out, "filesystem_path", &path.as_ref().map(|p| p.display().to_string()));
                push_opt(&mut out, "parent", parent);
                push_opt(&mut out, "possible_match", possible_match);
                out.push(("image_count", image_count.to_string()));
                out.push(("video_count", video_count.to_string()));
                out.push(("has_config", has_metadata.to_string()));
            }
            IssueDetails::Duplicate { occurrences, paths } => {
                out.push(("occurrences", occurrences.to_string()));
                for path in paths {
                    out.push(("path", path.display().to_string()));
                }
            }
            IssueDetails::Count {
                filesystem_identifier,
                filesystem,
                database,
                difference,
                note,
                ..
            } => {
                out.push(("filesystem_slug", filesystem_identifier.clone()));
                out.push(("filesystem", filesystem.to_string()));
                out.push(("database", database.to_string()));
                out.push(("difference", format!("{:+}", difference)));
                push_opt(&mut out, "note", note);
            }
            IssueDetails::Config {
                filesystem_keys,
                database_keys,
                note,
                ..
            } => {
                if !filesystem_keys.is_empty() {
                    out.push(("fs_keys", filesystem_keys.join(", ")));
                }
                if !database_keys.is_empty() {
                    out.push(("db_keys", database_keys.join(", ")));
                }
                push_opt(&mut out, "note", note);
            }
            IssueDetails::Hierarchy {
                filesystem_parent,
                database_parent,
                expected_parent,
            } => {
                push_opt(&mut out, "filesystem_parent", filesystem_parent);
                push_opt(&mut out, "database_parent", database_parent);
                push_opt(&mut out, "expected_parent", expected_parent);
            }
        }
        out
    }
}

fn push_opt(out: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(v) = value {
        out.push((key, v.clone()));
    }
}

/// One finding about one run. Never mutates either source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub category: Category,
    pub severity: Severity,
    pub identifier: String,
    pub message: String,
    pub details: IssueDetails,
}

impl ValidationIssue {
    pub fn new(
        category: Category,
        severity: Severity,
        identifier: impl Into<String>,
        message: impl Into<String>,
        details: IssueDetails,
    ) -> Self {
        Self {
            category,
            severity,
            identifier: identifier.into(),
            message: message.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_serializes_with_tagged_details() {
        let issue = ValidationIssue::new(
            Category::CountMismatch,
            Severity::Warning,
            "cafe-coffee",
            "Image count mismatch",
            IssueDetails::Count {
                count: CountKind::Images,
                filesystem_identifier: "cafe-coffee".to_string(),
                filesystem: 10,
                database: 7,
                difference: 3,
                note: None,
            },
        );
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["category"], json!("Count Mismatch"));
        assert_eq!(value["severity"], json!("warning"));
        assert_eq!(value["details"]["kind"], json!("count"));
        assert_eq!(value["details"]["count"], json!("images"));
        assert_eq!(value["details"]["difference"], json!(3));
    }

    #[test]
    fn test_fields_skip_absent_values() {
        let details = IssueDetails::Hierarchy {
            filesystem_parent: Some("Gynoids".to_string()),
            database_parent: None,
            expected_parent: Some("gynoids".to_string()),
        };
        let keys: Vec<&str> = details.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["filesystem_parent", "expected_parent"]);
    }

    #[test]
    fn test_category_order_matches_rule_order() {
        let mut shuffled = vec![
            Category::HierarchyMismatch,
            Category::OrphanedEntry,
            Category::CountMismatch,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![
                Category::OrphanedEntry,
                Category::CountMismatch,
                Category::HierarchyMismatch
            ]
        );
    }
}
