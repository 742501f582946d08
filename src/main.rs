use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mintable::config::{Config, DEFAULT_CONFIG_PATH, InputSource};
use mintable::storage::open_driver;
use mintable::{CommandRegistry, Database, Repl, Schema};

#[derive(Parser)]
#[command(name = "mintable")]
#[command(about = "Interactive interpreter over a schema-validated in-memory table")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "MINTABLE_CONFIG")]
    config: Option<PathBuf>,

    /// Schema file (YAML), overrides `schema.path`
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Statement script to run instead of reading stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path, true)?,
        None => Config::load(DEFAULT_CONFIG_PATH, false)?,
    };
    if let Some(path) = cli.schema {
        config.schema.path = path;
    }
    if let Some(path) = cli.input {
        config.repl.infile = InputSource::File(path);
    }
    config.general.debug |= cli.debug;

    let default_level = if config.general.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let schema = Schema::load(&config.schema.path)
        .with_context(|| format!("failed to load schema from {}", config.schema.path.display()))?;
    let driver = open_driver(config.data.driver, schema.primary_key());
    let registry = CommandRegistry::builtin().context("failed to build command table")?;
    info!(
        driver = ?config.data.driver,
        input = %config.repl.infile,
        commands = registry.len(),
        "starting interpreter"
    );

    let db = Database::new(schema, driver, &registry);
    let mut repl = Repl::new(db, config.repl.prompt, config.repl.banner);
    repl.run(&config.repl.infile, config.repl.history_file.as_deref())
}
