use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "catalog-audit")]
#[command(about = "Reconcile a content directory tree against its collection catalog", long_about = None)]
pub struct Cli {
    /// Explicit configuration file, layered over Config.* and validate_config.*
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan both sides and report every discrepancy
    Validate {
        #[command(flatten)]
        source: SourceArgs,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scan the content directory only and list what was found
    ScanFs {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
    },
    /// Walk the catalog only and list what was found
    ScanCatalog {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print configuration values
    PrintConfig {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Overrides for the loaded configuration.
#[derive(Debug, Default, Args)]
pub struct SourceArgs {
    /// Content root directory
    #[arg(long)]
    pub content_root: Option<PathBuf>,
    /// Catalog API base URL
    #[arg(long)]
    pub api_url: Option<String>,
    /// Extra directory name or glob to exclude (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

impl Commands {
    pub fn json(&self) -> bool {
        match self {
            Commands::Validate { json, .. }
            | Commands::ScanFs { json, .. }
            | Commands::ScanCatalog { json, .. } => *json,
            Commands::PrintConfig { .. } => false,
        }
    }

    pub fn source(&self) -> &SourceArgs {
        match self {
            Commands::Validate { source, .. }
            | Commands::ScanFs { source, .. }
            | Commands::ScanCatalog { source, .. }
            | Commands::PrintConfig { source } => source,
        }
    }
}
