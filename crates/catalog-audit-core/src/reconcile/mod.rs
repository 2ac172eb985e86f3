pub mod issue;
pub mod match_table;
pub mod rules;

pub use issue::{Category, CountKind, IssueDetails, MetadataPresence, Severity, ValidationIssue};
pub use match_table::{MatchKind, MatchTable};
pub use rules::{default_rules, run_rules, Rule, RuleContext};

use crate::model::RecordMap;

/// Build the match table and run the default battery over two scanned maps.
pub fn reconcile(filesystem: &RecordMap, catalog: &RecordMap) -> (MatchTable, Vec<ValidationIssue>) {
    let matches = MatchTable::build(filesystem, catalog);
    let ctx = RuleContext::new(filesystem, catalog, &matches);
    let issues = run_rules(&default_rules(), &ctx);
    (matches, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectoryRecord;

    #[test]
    fn test_matched_pair_raises_no_presence_issues() {
        let fs: RecordMap = [("cafe".to_string(), DirectoryRecord::new("Cafe"))]
            .into_iter()
            .collect();
        let db: RecordMap = [("cafe".to_string(), DirectoryRecord::new("cafe"))]
            .into_iter()
            .collect();

        let (matches, issues) = reconcile(&fs, &db);
        assert_eq!(matches.get("cafe"), Some("cafe"));
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }
}
