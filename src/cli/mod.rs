//! Command-line interface for mongoport
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and argument overrides
//! - Shell completion generation ([`completion`])
//! - Terminal progress display for background jobs ([`progress`])

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, LogLevel};
use crate::error::Result;
use crate::export::ExportFormat;

pub mod completion;
pub mod progress;

pub use completion::generate_completion;
pub use progress::ProgressDisplay;

/// mongoport - MongoDB export, import and schema tool
#[derive(Parser, Debug)]
#[command(
    name = "mongoport",
    version,
    about = "Export, import and map MongoDB databases",
    long_about = "Streams MongoDB collections to SQL, JSON, CSV or BSON files, imports
JSON, JSON lines, CSV and BSON files, and infers a relational diagram from
a sampled schema."
)]
pub struct CliArgs {
    /// MongoDB connection URI (overrides connection.default_uri)
    ///
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    #[arg(long, global = true, value_name = "URI")]
    pub uri: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (no progress bar)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Connection timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongoport
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export collections to one file per collection (or one SQL script)
    Export(ExportArgs),

    /// Import files, one collection per file named after the file stem
    Import {
        /// Files to import (.json, .jsonl, .ndjson, .csv, .bson)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Sample every collection and print the inferred relationships
    Schema {
        /// Save the schema map as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Save the diagram as Graphviz DOT
        #[arg(long, value_name = "FILE")]
        dot: Option<PathBuf>,
    },

    /// Infer relationships from a schema map saved by `schema --json`
    Relations {
        /// Saved schema map
        #[arg(value_name = "SCHEMA_JSON")]
        schema: PathBuf,

        /// Save the diagram as Graphviz DOT
        #[arg(long, value_name = "FILE")]
        dot: Option<PathBuf>,
    },

    /// Show which document a foreign-key value points to
    Link {
        /// Saved schema map
        #[arg(value_name = "SCHEMA_JSON")]
        schema: PathBuf,

        /// Reference field, e.g. user_id
        #[arg(value_name = "FIELD")]
        field: String,

        /// Cell value, an ObjectId hex string or a plain identifier
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Insert pasted JSON or CSV into a collection
    Paste {
        /// Target collection
        #[arg(long, value_name = "NAME")]
        collection: String,

        /// Read from a file instead of stdin
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Manage query history and bookmarks
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Print the effective configuration as TOML
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Arguments of `mongoport export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Output format (json, sql, postgresql, csv, bson)
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: ExportFormat,

    /// Keep `_id` and `__v`
    #[arg(long = "include-meta")]
    pub include_meta: bool,

    /// Export only this collection (repeatable)
    #[arg(long = "collection", value_name = "NAME")]
    pub collections: Vec<String>,
}

/// History subcommands
#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Print history and bookmarks
    List,

    /// Record a query filter
    Add {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Save a named query filter
    Bookmark {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Empty the history, keeping bookmarks
    Clear,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// An invalid configuration is reported and replaced by the defaults.
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Apply command-line overrides to the configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.uri {
            config.connection.default_uri = uri.clone();
        }
        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
        if args.very_verbose {
            config.logging.level = LogLevel::Trace;
        } else if args.verbose {
            config.logging.level = LogLevel::Debug;
        } else if args.quiet {
            config.logging.level = LogLevel::Error;
        }
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connection URI after overrides
    pub fn connection_uri(&self) -> &str {
        &self.config.connection.default_uri
    }

    /// Whether the progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.args.quiet
    }
}
