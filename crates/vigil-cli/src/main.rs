//! Vigil CLI - Command-line interface for column expectations and the cloud store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vigil_core::{
    check_suite, ExpectationRegistry, ExpectationSuite, ResultFormatLevel, RuntimeConfiguration,
    SqlExecutionEngine, Validator,
};
use vigil_store::{
    CheckpointConfig, CloudStoreBackend, CloudStoreConfig, StoreBackend, StoreKey,
};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Data validation - check columns against declarative expectations")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a data file against an expectation suite
    Validate {
        /// Path to a CSV or Parquet file
        #[arg(short, long)]
        data: PathBuf,

        /// Path to the expectation suite JSON file
        #[arg(short, long)]
        suite: PathBuf,

        /// BOOLEAN_ONLY, BASIC, SUMMARY or COMPLETE
        #[arg(short, long)]
        result_format: Option<String>,

        /// Table name the data file is registered under
        #[arg(short, long, default_value = "data")]
        table: String,

        /// Report metric failures as failed results instead of aborting
        #[arg(long)]
        catch_exceptions: bool,
    },

    /// Check every expectation configuration of a suite without reading data
    CheckSuite {
        /// Path to the expectation suite JSON file
        suite: PathBuf,
    },

    /// Read or write checkpoints in the cloud store (configured from the environment)
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Fetch a checkpoint by id
    Get {
        /// Resource id
        id: String,
    },

    /// Create a checkpoint from a JSON file
    Put {
        /// Path to the checkpoint JSON file
        checkpoint: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Validate {
            data,
            suite,
            result_format,
            table,
            catch_exceptions,
        } => {
            run_validation(&data, &suite, result_format, &table, catch_exceptions).await?;
        }
        Commands::CheckSuite { suite } => {
            check_suite_file(&suite)?;
        }
        Commands::Store { command } => {
            run_store_command(command).await?;
        }
    }

    Ok(())
}

fn load_suite(path: &Path) -> Result<ExpectationSuite> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid suite file {:?}", path))
}

async fn run_validation(
    data: &Path,
    suite_path: &Path,
    result_format: Option<String>,
    table: &str,
    catch_exceptions: bool,
) -> Result<()> {
    let suite = load_suite(suite_path)?;
    info!(
        "Loaded suite '{}' with {} expectations",
        suite.expectation_suite_name,
        suite.expectations.len()
    );

    // Reject a bad level before any data is read
    if let Some(level) = &result_format {
        ResultFormatLevel::parse(level)?;
    }

    let engine = SqlExecutionEngine::new(table);
    register_source(&engine, data).await?;

    let runtime = RuntimeConfiguration {
        result_format: result_format.map(Value::String),
        catch_exceptions: catch_exceptions.then_some(true),
        ..Default::default()
    };

    let validator = Validator::new(engine);
    let result = validator.validate_suite(&suite, &runtime).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    eprintln!("\n=== Validation Complete ===");
    eprintln!("Suite: {}", result.expectation_suite_name);
    eprintln!(
        "Successful: {}/{}",
        result.statistics.successful_expectations, result.statistics.evaluated_expectations
    );

    if !result.success {
        anyhow::bail!(
            "Validation failed: {} of {} expectations unsuccessful",
            result.statistics.unsuccessful_expectations,
            result.statistics.evaluated_expectations
        );
    }

    Ok(())
}

async fn register_source(engine: &SqlExecutionEngine, path: &Path) -> Result<()> {
    let path_str = path
        .to_str()
        .with_context(|| format!("Path is not valid UTF-8: {:?}", path))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            engine.register_csv(path_str).await?;
            info!("Registered CSV '{}' as '{}'", path_str, engine.table());
        }
        Some("parquet") => {
            engine.register_parquet(path_str).await?;
            info!("Registered Parquet '{}' as '{}'", path_str, engine.table());
        }
        _ => anyhow::bail!("Unsupported file format: {}", path_str),
    }

    Ok(())
}

fn check_suite_file(path: &Path) -> Result<()> {
    info!("Checking suite: {:?}", path);

    let suite = load_suite(path)?;
    let registry = ExpectationRegistry::with_builtin_expectations();

    match check_suite(&suite, &registry) {
        Ok(()) => {
            println!("Suite is valid!");
            println!("  Name: {}", suite.expectation_suite_name);
            println!("  Expectations: {}", suite.expectations.len());
            for config in &suite.expectations {
                println!(
                    "    - {} on {}",
                    config.expectation_type,
                    config.column().unwrap_or("<none>")
                );
            }
            Ok(())
        }
        Err(errors) => {
            eprintln!("Suite check failed:");
            for (index, error) in &errors {
                eprintln!(
                    "  - expectation {} ({}): {}",
                    index, suite.expectations[*index].expectation_type, error
                );
            }
            anyhow::bail!("Check failed with {} errors", errors.len());
        }
    }
}

async fn run_store_command(command: StoreCommands) -> Result<()> {
    let settings = CloudStoreConfig::from_env()?;
    let store = CloudStoreBackend::new(settings).context("Failed to create cloud store")?;

    match command {
        StoreCommands::Get { id } => {
            let body = store.get(&StoreKey::resource(id)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        StoreCommands::Put { checkpoint } => {
            let content = std::fs::read_to_string(&checkpoint)
                .with_context(|| format!("Failed to read checkpoint {:?}", checkpoint))?;
            let config: CheckpointConfig = serde_json::from_str(&content)
                .with_context(|| format!("Invalid checkpoint file {:?}", checkpoint))?;

            info!("Submitting checkpoint '{}'", config.name);
            let response = store
                .set(&StoreKey::resource(config.name.as_str()), &config)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
