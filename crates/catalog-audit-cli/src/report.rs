use catalog_audit_core::report::{group_by_category, recommendations, AuditSummary, Verdict};
use catalog_audit_core::scanner::FetchFailure;
use catalog_audit_core::{AuditConfig, AuditOutcome, RecordMap, Severity, ValidationIssue};
use chrono::Local;
use colored::*;

const RULE: &str = "================================================================================";

fn icon(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✗".red(),
        Severity::Warning => "⚠".yellow(),
        Severity::Info => "ℹ".blue(),
    }
}

fn heading(title: &str) {
    println!();
    println!("{}", RULE);
    println!("{}", title.bold());
    println!("{}", RULE);
}

pub fn print_header(config: &AuditConfig) {
    heading("COLLECTION CATALOG AUDIT");
    println!("Content root: {}", config.content_root.display());
    println!("Catalog API:  {}", config.api_base());
    println!("Started:      {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
}

fn print_summary(summary: &AuditSummary) {
    heading("SUMMARY");
    println!(
        "Directories:  {} on filesystem, {} in database ({} matched)",
        summary.filesystem_directories, summary.catalog_directories, summary.matched
    );
    println!(
        "Images:       {} on filesystem, {} in database",
        summary.filesystem_images, summary.catalog_images
    );
    println!(
        "Videos:       {} on filesystem, {} in database",
        summary.filesystem_videos, summary.catalog_videos
    );
    println!(
        "Issues:       {} errors, {} warnings, {} info",
        summary.errors.to_string().red(),
        summary.warnings.to_string().yellow(),
        summary.infos.to_string().blue()
    );
    if summary.fetch_failures > 0 {
        println!(
            "Fetches:      {} sub-collections could not be fetched",
            summary.fetch_failures.to_string().yellow()
        );
    }
}

fn print_issue(issue: &ValidationIssue) {
    println!("  {} {}: {}", icon(issue.severity), issue.identifier.bold(), issue.message);
    for (key, value) in issue.details.fields() {
        println!("      {}: {}", key.dimmed(), value);
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    for (category, group) in group_by_category(issues) {
        heading(&format!("{} ({})", category.label().to_uppercase(), group.len()));
        for issue in group {
            print_issue(issue);
        }
    }
}

fn print_fetch_failures(failures: &[FetchFailure]) {
    if failures.is_empty() {
        return;
    }
    heading(&format!("FETCH FAILURES ({})", failures.len()));
    for failure in failures {
        match &failure.parent {
            Some(parent) => println!(
                "  {} {} (under {}): {}",
                "⚠".yellow(),
                failure.identifier.bold(),
                parent,
                failure.reason
            ),
            None => println!("  {} {}: {}", "⚠".yellow(), failure.identifier.bold(), failure.reason),
        }
    }
}

fn print_verdict(verdict: Verdict, recommendations: &[String]) {
    heading("VERDICT");
    match verdict {
        Verdict::Clean => println!("{} No issues found", "✓".green()),
        Verdict::Findings {
            errors,
            warnings,
            infos,
        } => {
            let mark = if errors > 0 { "✗".red() } else { "⚠".yellow() };
            println!(
                "{} Found {} errors, {} warnings, {} info",
                mark, errors, warnings, infos
            );
        }
    }
    if !recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".bold());
        for (i, line) in recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, line);
        }
    }
}

/// Human-readable report of a finished audit.
pub fn print_outcome(outcome: &AuditOutcome) {
    let summary = outcome.summary();
    print_summary(&summary);
    print_issues(&outcome.issues);
    print_fetch_failures(&outcome.fetch_failures);
    print_verdict(summary.verdict(), &recommendations(outcome));
    println!();
}

/// One line per record of a single-side scan.
pub fn print_records(title: &str, records: &RecordMap) {
    heading(&format!("{} ({})", title, records.len()));
    for (key, record) in records.iter() {
        let parent = record
            .parent_identifier
            .as_deref()
            .map(|p| format!(" <- {}", p))
            .unwrap_or_default();
        if record.partial {
            println!("  {}{}  {}", key.bold(), parent.dimmed(), "detail unavailable".yellow());
            continue;
        }
        println!(
            "  {}{}  {} images, {} videos, {} children{}",
            key.bold(),
            parent.dimmed(),
            record.image_count,
            record.video_count,
            record.child_count,
            if record.has_metadata() { ", config" } else { "" }
        );
        let extra = records.occurrences(key).len();
        if extra > 1 {
            println!("      {} {} directories share this key", "⚠".yellow(), extra);
        }
    }
    println!(
        "{} directories, {} images, {} videos",
        records.record_count(),
        records.total_images(),
        records.total_videos()
    );
}
