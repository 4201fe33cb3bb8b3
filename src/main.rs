use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use minirel::demo::{setup_statements, tutorial_steps};
use minirel::{Database, EngineConfig, Statement};

#[derive(Parser)]
#[command(author, version, about = "minirel - a minimal relational query engine")]
struct Cli {
    /// JSON engine configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Make LIKE ignore case
    #[arg(long, global = true)]
    case_insensitive_like: bool,

    /// Sort NULLs after other values in ascending order
    #[arg(long, global = true)]
    nulls_last: bool,

    /// Maximum number of rows a query may return
    #[arg(long, global = true)]
    max_rows: Option<usize>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the customers/orders dataset and run the guided tour
    Demo,

    /// Execute a JSON array of statements
    Run {
        /// Path to the statements file
        path: PathBuf,
    },
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if self.case_insensitive_like {
            config = config.with_like_case_sensitive(false);
        }
        if self.nulls_last {
            config = config.with_nulls_first(false);
        }
        if self.max_rows.is_some() {
            config = config.with_max_result_rows(self.max_rows);
        }
        Ok(config)
    }
}

fn run_demo(db: &Database) -> Result<()> {
    db.execute_all(setup_statements()).context("Failed to load demo dataset")?;

    for step in tutorial_steps() {
        println!("-- {}", step.title);
        let result = db
            .execute(step.statement)
            .with_context(|| format!("Demo step failed: {}", step.title))?;
        println!("{}", result.to_string_table());
    }
    Ok(())
}

fn run_file(db: &Database, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let statements: Vec<Statement> =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse statements in {}", path.display()))?;
    info!("Loaded {} statement(s) from {}", statements.len(), path.display());

    for (index, statement) in statements.into_iter().enumerate() {
        let kind = statement.kind();
        let result = db
            .execute(statement)
            .with_context(|| format!("Statement {} ({}) failed", index + 1, kind))?;
        println!("{}", result.to_string_table());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str())).init();

    let db = Database::new(cli.engine_config()?);

    match &cli.command {
        Commands::Demo => run_demo(&db),
        Commands::Run { path } => run_file(&db, path),
    }
}
