//! mongoport
//!
//! Streams MongoDB collections to SQL, JSON, CSV or BSON files, imports
//! files back, and infers relationships between collections.
//!
//! # Usage
//!
//! ```bash
//! mongoport --uri mongodb://localhost:27017/shop export --format sql --out ./dump
//! mongoport import users.json orders.bson
//! mongoport schema --dot shop.dot
//! ```

use std::path::Path;
use std::sync::Arc;

use mongodb::bson::Bson;
use mongoport::cli::{CliInterface, Commands, ExportArgs, HistoryCommand, ProgressDisplay};
use mongoport::connection::MongoConnector;
use mongoport::error::{ConfigError, ExecutionError, MongoportError, Result};
use mongoport::export::ExportJob;
use mongoport::history::HistoryStore;
use mongoport::import::{ImportJob, parse_pasted};
use mongoport::jobs::{JobRunner, JobSpec, ProgressMessage, SchemaScanJob};
use mongoport::schema::{SchemaMap, infer_relationships, layout_schema, resolve_link, to_dot};
use mongoport::source::{ConnectionTarget, Connector};
use tracing::{debug, info};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Dispatch the subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    match &cli.args().command {
        Commands::Export(args) => run_export(&cli, args).await,
        Commands::Import { files } => {
            let job = ImportJob {
                target: import_target(&cli),
                files: files.clone(),
                settings: cli.config().import.clone(),
            };
            run_in_background(&cli, JobSpec::Import(job)).await?;
            Ok(())
        }
        Commands::Schema { json, dot } => run_schema(&cli, json.as_deref(), dot.as_deref()).await,
        Commands::Relations { schema, dot } => {
            let content = std::fs::read_to_string(schema)?;
            let schema: SchemaMap = serde_json::from_str(&content)?;
            report_relations(&schema, dot.as_deref())
        }
        Commands::Link {
            schema,
            field,
            value,
        } => {
            let content = std::fs::read_to_string(schema)?;
            let schema: SchemaMap = serde_json::from_str(&content)?;
            let collections: Vec<String> = schema.keys().cloned().collect();
            let target = resolve_link(field, value, &collections).ok_or_else(|| {
                ExecutionError::InvalidParameters(format!(
                    "'{}' does not reference a known collection",
                    field
                ))
            })?;
            let filter = Bson::Document(target.filter).into_relaxed_extjson();
            println!("{} {}", target.collection, filter);
            Ok(())
        }
        Commands::Paste { collection, file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            run_paste(&cli, collection, &text).await
        }
        Commands::History { action } => run_history(&cli, action),
        Commands::Completion { shell } => mongoport::cli::generate_completion(shell),
        Commands::Config { show, validate } => {
            if *validate {
                cli.config().validate()?;
                println!("Configuration is valid");
            }
            if *show || !*validate {
                let text = toml::to_string_pretty(cli.config())
                    .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
                print!("{}", text);
            }
            Ok(())
        }
    }
}

/// Connection target for reads, which need a database in the URI
fn export_target(cli: &CliInterface) -> ConnectionTarget {
    ConnectionTarget::new(cli.connection_uri())
}

/// Connection target for writes, falling back to the configured database
fn import_target(cli: &CliInterface) -> ConnectionTarget {
    ConnectionTarget::new(cli.connection_uri())
        .with_fallback_database(cli.config().connection.fallback_database.clone())
}

async fn run_export(cli: &CliInterface, args: &ExportArgs) -> Result<()> {
    let job = ExportJob {
        target: export_target(cli),
        destination: args.out.clone(),
        format: args.format,
        include_metadata: args.include_meta,
        collections: args.collections.clone(),
        settings: cli.config().export.clone(),
    };
    run_in_background(cli, JobSpec::Export(job)).await?;
    Ok(())
}

async fn run_schema(cli: &CliInterface, json: Option<&Path>, dot: Option<&Path>) -> Result<()> {
    let job = SchemaScanJob {
        target: export_target(cli),
        sample_size: cli.config().schema.sample_size,
    };
    let mut display = run_in_background(cli, JobSpec::SchemaScan(job)).await?;
    let schema = display.take_schema().unwrap_or_default();

    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&schema)?)?;
        info!("Saved schema map to {}", path.display());
    }
    report_relations(&schema, dot)
}

/// Print the inferred relationships and optionally save the diagram
fn report_relations(schema: &SchemaMap, dot: Option<&Path>) -> Result<()> {
    let edges = infer_relationships(schema);
    if edges.is_empty() {
        println!("No relationships found between {} collections", schema.len());
    }
    for edge in &edges {
        println!("{}.{} -> {}", edge.source, edge.field, edge.target);
    }

    if let Some(path) = dot {
        let layout = layout_schema(schema, &edges);
        std::fs::write(path, to_dot(schema, &layout))?;
        info!("Saved diagram to {}", path.display());
    }
    Ok(())
}

async fn run_paste(cli: &CliInterface, collection: &str, text: &str) -> Result<()> {
    let docs = parse_pasted(text)?;
    let count = docs.len();

    let connector = MongoConnector::new(cli.config().connection.clone());
    let source = connector.connect(&import_target(cli)).await?;
    let outcome = source.insert_many(collection, docs).await;
    source.close().await?;
    outcome?;

    println!(
        "Inserted {} documents into {}.{}",
        count,
        source.database_name(),
        collection
    );
    Ok(())
}

fn run_history(cli: &CliInterface, action: &HistoryCommand) -> Result<()> {
    let store = HistoryStore::new(cli.config().history.file_path.clone())
        .with_max_entries(cli.config().history.max_entries);

    match action {
        HistoryCommand::List => {
            let data = store.load();
            println!("History:");
            for (i, query) in data.history.iter().enumerate() {
                println!("  {:>2}. {}", i + 1, query);
            }
            println!("Bookmarks:");
            for bookmark in &data.bookmarks {
                println!("  {}: {}", bookmark.name, bookmark.query);
            }
            Ok(())
        }
        HistoryCommand::Add { query } => store.add_to_history(query),
        HistoryCommand::Bookmark { name, query } => store.add_bookmark(name, query),
        HistoryCommand::Clear => store.clear_history(),
    }
}

/// Run a job in the background and relay its progress until it ends
///
/// Ctrl+C aborts the job; files already written stay on disk.
async fn run_in_background(cli: &CliInterface, spec: JobSpec) -> Result<ProgressDisplay> {
    let connector: Arc<dyn Connector> =
        Arc::new(MongoConnector::new(cli.config().connection.clone()));
    let mut runner = JobRunner::new(connector, &cli.config().jobs);
    let mut display = ProgressDisplay::new(cli.show_progress());

    let id = runner.start(spec)?;
    debug!("Waiting for job {}", id);

    let terminal = tokio::select! {
        result = runner.run_to_completion(|msg| display.handle(msg)) => result?,
        _ = tokio::signal::ctrl_c() => {
            runner.abort();
            display.finish();
            return Err(MongoportError::Generic(
                "Interrupted; the job was aborted".to_string(),
            ));
        }
    };

    match terminal {
        ProgressMessage::Error(text) => Err(MongoportError::Generic(text)),
        _ => Ok(display),
    }
}

/// Initialize logging system based on verbosity level
///
/// Command-line verbosity flags have already been folded into
/// `logging.level`.
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
