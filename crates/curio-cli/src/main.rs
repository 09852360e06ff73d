//! Curio CLI - conversational knowledge base

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use curio_core::config::Config;
use curio_core::domain::concept::{ConceptKind, ConceptStore};
use curio_core::engine::{ConversationEngine, EngineSettings, TurnKind};
use curio_core::gaps;
use curio_core::infrastructure::concept::SqliteConceptRepository;
use curio_core::storage::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "curio")]
#[command(author, version, about = "Conversational knowledge base that learns as you chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Database file (defaults to the configured path)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat and teach interactively (the default)
    Chat {
        /// Seed the reply generator for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Inspect learned concepts
    Concepts {
        #[command(subcommand)]
        action: ConceptAction,
    },

    /// List concepts with missing knowledge, most incomplete first
    Gaps,

    /// Show store totals
    Stats,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConceptAction {
    /// List all concepts
    List {
        /// Filter by kind (noun, verb, adjective)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Show everything known about one concept
    Show { identity: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("curio=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Chat { seed: None }) {
        Commands::Chat { seed } => {
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_chat(&db, config.engine_settings(), seed, cli.quiet).await
        }

        Commands::Concepts { action } => {
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_concepts(&db, action, cli.format, cli.quiet).await
        }

        Commands::Gaps => {
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_gaps(&db, cli.format, cli.quiet).await
        }

        Commands::Stats => {
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_stats(&db, cli.format).await
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(&config, cli.database.as_deref(), cli.quiet).await,
    }
}

async fn open_database(config: &Config, override_path: Option<&Path>) -> anyhow::Result<Database> {
    let db_config = match override_path {
        Some(path) => DatabaseConfig::with_path(path),
        None => config.database_config(),
    };
    Database::new(db_config).await
}

fn store_for(db: &Database) -> ConceptStore<SqliteConceptRepository> {
    ConceptStore::new(Arc::new(SqliteConceptRepository::new(db.pool().clone())))
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_chat(
    db: &Database,
    settings: EngineSettings,
    seed: Option<u64>,
    quiet: bool,
) -> anyhow::Result<()> {
    info!(path = %db.path().display(), "Chat session starting");

    let store = store_for(db);
    let mut engine = match seed {
        Some(seed) => ConversationEngine::with_seed(store, settings, seed),
        None => ConversationEngine::new(store, settings),
    };

    if !quiet {
        println!("Talk to me in plain statements and I'll learn from them.");
        println!("Type 'help' for commands, 'quit' to leave.");
        println!();
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(&line)?;
                }
                // an empty line is meaningful: it passes a pending question
                let outcome = engine.process_turn(&line).await?;
                println!("curio> {}", outcome.message);
                if outcome.kind == TurnKind::Farewell {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("curio> Goodbye! Keep learning!");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

async fn cmd_concepts(
    db: &Database,
    action: ConceptAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let store = store_for(db);

    match action {
        ConceptAction::List { kind } => {
            let kind = match kind.as_deref() {
                Some(raw) => Some(ConceptKind::parse(raw).ok_or_else(|| {
                    anyhow::anyhow!("Unknown kind '{}'. Use noun, verb, or adjective.", raw)
                })?),
                None => None,
            };
            let concepts = store.list_all(kind).await?;

            if matches!(format, OutputFormat::Json) {
                let items: Vec<serde_json::Value> = concepts
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "identity": c.identity,
                            "kind": c.kind.as_str(),
                            "attributes": c.attributes.len(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }

            if concepts.is_empty() {
                if !quiet {
                    println!("No concepts stored yet.");
                    println!("\nTeach some with: curio chat");
                }
            } else {
                if !quiet {
                    println!("Concepts:");
                }
                for concept in concepts {
                    println!(
                        "  {} ({}) - {} attributes",
                        concept.identity,
                        concept.kind.as_str().to_lowercase(),
                        concept.attributes.len()
                    );
                }
            }
        }
        ConceptAction::Show { identity } => {
            let concept = store.require(&identity).await?;

            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&concept)?);
                return Ok(());
            }

            println!("Concept: {}", concept.identity);
            println!("  Kind: {}", concept.kind.as_str());
            println!(
                "  Created: {}",
                concept.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if concept.attributes.is_empty() {
                println!("  No attributes yet.");
            } else {
                for (name, values) in concept.attributes.iter() {
                    println!("  {}: {}", name, values.join(", "));
                }
            }
        }
    }

    Ok(())
}

async fn cmd_gaps(db: &Database, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let store = store_for(db);
    let concepts = store.list_all(None).await?;
    let reports = gaps::rank(&concepts);

    if matches!(format, OutputFormat::Json) {
        let items: Vec<serde_json::Value> = reports
            .iter()
            .map(|r| {
                serde_json::json!({
                    "identity": r.identity,
                    "kind": r.kind.as_str(),
                    "completeness": r.completeness,
                    "priority": r.priority,
                    "missing": r.missing,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if reports.is_empty() {
        if !quiet {
            println!("Nothing is missing. Teach me more with: curio chat");
        }
    } else {
        if !quiet {
            println!("Knowledge gaps:");
        }
        for report in reports {
            println!(
                "  {} ({}) - {:.0}% complete, missing: {}",
                report.identity,
                report.kind.as_str().to_lowercase(),
                report.completeness * 100.0,
                report.missing.join(", ")
            );
        }
    }

    Ok(())
}

async fn cmd_stats(db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    let store = store_for(db);
    let stats = store.stats().await?;

    if matches!(format, OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "concepts": stats.total_concepts,
                "nouns": stats.nouns,
                "verbs": stats.verbs,
                "adjectives": stats.adjectives,
                "facts": stats.total_attributes,
            }))?
        );
        return Ok(());
    }

    println!("Store:");
    println!("  Concepts: {}", stats.total_concepts);
    println!("    Nouns: {}", stats.nouns);
    println!("    Verbs: {}", stats.verbs);
    println!("    Adjectives: {}", stats.adjectives);
    println!("  Facts: {}", stats.total_attributes);

    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(
    config: &Config,
    database: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    if !quiet {
        println!("Curio Health Check");
        println!("==================");
        println!();
    }

    let mut all_ok = true;

    match config.validate() {
        Ok(()) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    match open_database(config, database).await {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", db.path().display());
                }

                match db.migration_status().await {
                    Ok(status) if status.needs_migration => {
                        all_ok = false;
                        if !quiet {
                            println!(
                                "[!!] Database: Migrations pending (v{} -> v{})",
                                status.current_version, status.target_version
                            );
                        }
                    }
                    Ok(status) => {
                        if !quiet {
                            println!("[OK] Database: Schema v{}", status.current_version);
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Database: Migration check failed - {}", e);
                        }
                    }
                }

                if !quiet {
                    match store_for(&db).count().await {
                        Ok(count) => println!("     Concepts: {}", count),
                        Err(e) => println!("[!!] Concepts: Count failed - {}", e),
                    }
                }
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Health check failed - {}", e);
                }
            }
        },
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to open - {}", e);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
