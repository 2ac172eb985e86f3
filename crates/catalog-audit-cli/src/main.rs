mod commands;
mod logging;
mod progress;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use catalog_audit_core::report::AuditReport;
use catalog_audit_core::scanner::FilesystemScanner;
use catalog_audit_core::{AuditConfig, AuditEngine, ProgressReporter, SilentReporter};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, SourceArgs};
use dotenv::dotenv;
use progress::CliReporter;
use serde_json::json;
use tracing::{error, info};

/// Setup failed before any finding could be produced.
const EXIT_FATAL: u8 = 2;
/// The audit ran and found error-severity issues.
const EXIT_FINDINGS: u8 = 1;

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();
    let json_output = args.command.as_ref().is_some_and(Commands::json);

    let _guard = logging::init_logger(!json_output);

    let command = match args.command {
        Some(command) => command,
        None => {
            let _ = Cli::command().print_long_help();
            return ExitCode::SUCCESS;
        }
    };

    let config = match catalog_audit_core::config::load_configuration(args.config.as_deref()) {
        Ok(config) => apply_overrides(config, command.source()),
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let result = match &command {
        Commands::Validate { json, .. } => run_validate(config, *json),
        Commands::ScanFs { json, .. } => run_scan_fs(&config, *json),
        Commands::ScanCatalog { json, .. } => run_scan_catalog(config, *json),
        Commands::PrintConfig { .. } => print_config(&config),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn apply_overrides(mut config: AuditConfig, source: &SourceArgs) -> AuditConfig {
    if let Some(root) = &source.content_root {
        config.content_root = root.clone();
    }
    if let Some(url) = &source.api_url {
        config.api_base_url = url.clone();
    }
    config.excluded_dirs.extend(source.exclude.iter().cloned());
    config
}

fn reporter(json: bool) -> Box<dyn ProgressReporter> {
    if json {
        Box::new(SilentReporter)
    } else {
        Box::new(CliReporter::new())
    }
}

fn run_validate(config: AuditConfig, json: bool) -> anyhow::Result<ExitCode> {
    if !json {
        report::print_header(&config);
    }
    let engine = AuditEngine::new(config).context("Failed to set up catalog client")?;
    let outcome = engine.run(reporter(json).as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&AuditReport::new(&outcome))?);
    } else {
        report::print_outcome(&outcome);
        info!(
            "Filesystem: {}, Catalog: {}, Reconcile: {}",
            format!("{:.2}s", outcome.timings.filesystem.as_secs_f64()).green(),
            format!("{:.2}s", outcome.timings.catalog.as_secs_f64()).green(),
            format!("{:.2}s", outcome.timings.reconcile.as_secs_f64()).green(),
        );
    }

    Ok(if outcome.has_errors() {
        ExitCode::from(EXIT_FINDINGS)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_scan_fs(config: &AuditConfig, json: bool) -> anyhow::Result<ExitCode> {
    let reporter = reporter(json);
    let records = FilesystemScanner::from_config(config).scan(reporter.as_ref())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        report::print_records("FILESYSTEM DIRECTORIES", &records);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_scan_catalog(config: AuditConfig, json: bool) -> anyhow::Result<ExitCode> {
    let reporter = reporter(json);
    let engine = AuditEngine::new(config).context("Failed to set up catalog client")?;
    let scan = engine.scan_catalog(reporter.as_ref())?;
    if json {
        let body = json!({ "records": scan.records, "fetch_failures": scan.failures });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        report::print_records("CATALOG COLLECTIONS", &scan.records);
        for failure in &scan.failures {
            println!("  {} {}: {}", "⚠".yellow(), failure.identifier, failure.reason);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_config(config: &AuditConfig) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_replace_and_extend() {
        let source = SourceArgs {
            content_root: Some(PathBuf::from("/srv/content")),
            api_url: None,
            exclude: vec!["drafts".to_string()],
        };
        let config = apply_overrides(AuditConfig::default(), &source);
        assert_eq!(config.content_root, PathBuf::from("/srv/content"));
        assert_eq!(config.api_base_url, AuditConfig::default().api_base_url);
        assert!(config.excluded_dirs.contains(&".thumbnails".to_string()));
        assert_eq!(config.excluded_dirs.last().map(String::as_str), Some("drafts"));
    }
}
