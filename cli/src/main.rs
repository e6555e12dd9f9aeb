use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use promptdb_core::{ValidationError, validate_definition};
use promptdb_loader::{PromptFile, StoreConfig, load_definition};
use promptdb_sqlite::{Migration, PromptVersionRepository, open_store};
use rusqlite::Connection;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "promptdb")]
#[command(about = "Versioned prompt definition storage", version)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Store configuration file (YAML).
    #[arg(long, global = true, conflicts_with = "db")]
    config: Option<PathBuf>,
    /// Database file path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Table prefix (default: prompt_, or the configured one).
    #[arg(long, global = true)]
    prefix: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create, drop, or inspect the prompt tables.
    Migrate(MigrateArgs),
    /// Store prompt files, creating a new version for each changed prompt.
    Add(AddArgs),
    /// Store every prompt file of a directory.
    Seed(SeedArgs),
    /// List the latest version of every prompt.
    List(ListArgs),
    /// Print the latest version of a prompt as JSON.
    Show(ShowArgs),
    /// Write the latest version of a prompt as a prompt file.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create the prompt tables.
    Up,
    /// Drop the prompt tables.
    Down,
    /// Show table status and row counts.
    Status,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Prompt files (YAML).
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct SeedArgs {
    /// Directory with prompt files.
    source: PathBuf,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print full versions as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Prompt name.
    name: String,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Prompt name.
    name: String,
    /// Output file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = resolve_config(&cli.store).and_then(|config| match cli.command {
        Command::Migrate(args) => run_migrate(&config, args),
        Command::Add(args) => run_add(&config, args),
        Command::Seed(args) => run_seed(&config, args),
        Command::List(args) => run_list(&config, args),
        Command::Show(args) => run_show(&config, args),
        Command::Export(args) => run_export(&config, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Builds the store configuration from `--config` or `--db`, then applies `--prefix`.
fn resolve_config(args: &StoreArgs) -> Result<StoreConfig, String> {
    let mut config = match (&args.config, &args.db) {
        (Some(path), _) => StoreConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        (None, Some(db)) => StoreConfig::new(db),
        (None, None) => return Err("either --config or --db is required".to_string()),
    };
    if let Some(prefix) = &args.prefix {
        config.table_prefix = prefix.clone();
    }
    Ok(config)
}

fn open(config: &StoreConfig) -> Result<Connection, String> {
    open_store(config)
        .map_err(|e| format!("Failed to open database '{}': {e}", config.path.display()))
}

fn open_migration(config: &StoreConfig) -> Result<Migration, String> {
    Migration::new(open(config)?, config.table_prefix.as_str())
        .map_err(|e| format!("Failed to initialize migration: {e}"))
}

fn open_repository<'a>(
    conn: &'a Connection,
    config: &StoreConfig,
) -> Result<PromptVersionRepository<'a>, String> {
    PromptVersionRepository::new(conn, config.table_prefix.as_str())
        .map_err(|e| format!("Failed to open prompt store: {e}"))
}

// ---------------------------------------------------------------------------
// migrate command
// ---------------------------------------------------------------------------

fn run_migrate(config: &StoreConfig, args: MigrateArgs) -> Result<(), String> {
    let mut migration = open_migration(config)?;
    match args.operation {
        MigrateOperation::Up => {
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            println!(
                "Migration up complete. Tables created with prefix '{}' in '{}'.",
                config.table_prefix,
                config.path.display()
            );
        }
        MigrateOperation::Down => {
            migration
                .down()
                .map_err(|e| format!("Migration down failed: {e}"))?;
            println!(
                "Migration down complete. Tables with prefix '{}' dropped from '{}'.",
                config.table_prefix,
                config.path.display()
            );
        }
        MigrateOperation::Status => {
            let status = migration
                .status()
                .map_err(|e| format!("Failed to get migration status: {e}"))?;
            println!("Migration Status:");
            println!(
                "  Tables exist: {}",
                if status.tables_exist { "yes" } else { "no" }
            );
            println!("  Prompt count: {}", status.prompt_count);
            println!("  Version count: {}", status.version_count);
            println!("  Parameter count: {}", status.parameter_count);
            println!("  Default count: {}", status.default_count);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// add / seed commands
// ---------------------------------------------------------------------------

fn run_add(config: &StoreConfig, args: AddArgs) -> Result<(), String> {
    let conn = open(config)?;
    let repo = open_repository(&conn, config)?;

    for path in &args.files {
        let definition = load_definition(path)
            .map_err(|e| format!("Failed to load '{}': {e}", path.display()))?;

        for finding in validate_definition(&definition) {
            if let ValidationError::OrphanedDefault(name) = finding {
                warn!(file = %path.display(), default = %name, "default has no parameter and will not be stored");
            }
        }

        let outcome = repo.add_version(&definition).map_err(|e| e.to_string())?;
        let verb = if outcome.created { "created" } else { "unchanged" };
        println!("{verb} {} v{}", definition.name(), outcome.version);
    }
    Ok(())
}

fn run_seed(config: &StoreConfig, args: SeedArgs) -> Result<(), String> {
    let mut migration = open_migration(config)?;
    let report = migration
        .seed(&args.source)
        .map_err(|e| format!("Seed failed: {e}"))?;
    println!("Seed complete:");
    println!("  Files read: {}", report.files);
    println!("  Versions created: {}", report.created);
    println!("  Unchanged: {}", report.unchanged);
    Ok(())
}

// ---------------------------------------------------------------------------
// read commands
// ---------------------------------------------------------------------------

fn run_list(config: &StoreConfig, args: ListArgs) -> Result<(), String> {
    let conn = open(config)?;
    let repo = open_repository(&conn, config)?;
    let versions = repo
        .load_latest_per_name()
        .map_err(|e| format!("Failed to load prompts: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&versions)
            .map_err(|e| format!("Failed to serialize prompts: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    for stored in &versions {
        println!(
            "{:<30} v{:<4} {:<20} {}",
            stored.name(),
            stored.version,
            stored.definition.model().unwrap_or("-"),
            stored.created_at.to_rfc3339()
        );
    }
    Ok(())
}

fn run_show(config: &StoreConfig, args: ShowArgs) -> Result<(), String> {
    let conn = open(config)?;
    let repo = open_repository(&conn, config)?;
    let stored = repo
        .get_latest_by_name(&args.name)
        .map_err(|e| format!("Failed to load prompt: {e}"))?
        .ok_or_else(|| format!("prompt '{}' not found", args.name))?;

    let json = serde_json::to_string_pretty(&stored)
        .map_err(|e| format!("Failed to serialize prompt: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_export(config: &StoreConfig, args: ExportArgs) -> Result<(), String> {
    let conn = open(config)?;
    let repo = open_repository(&conn, config)?;
    let stored = repo
        .get_latest_by_name(&args.name)
        .map_err(|e| format!("Failed to load prompt: {e}"))?
        .ok_or_else(|| format!("prompt '{}' not found", args.name))?;

    let yaml = PromptFile::from_definition(&stored.definition)
        .to_yaml()
        .map_err(|e| format!("Failed to serialize prompt: {e}"))?;

    match &args.output {
        Some(path) => {
            fs::write(path, yaml)
                .map_err(|e| format!("Failed to write '{}': {e}", path.display()))?;
            println!("Exported {} v{} to {}", args.name, stored.version, path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
