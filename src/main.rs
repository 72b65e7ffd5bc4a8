use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use workflow_engine::{
    init_telemetry, run_server, shutdown_telemetry, validate_definition, EngineConfig,
    WorkflowDefinition, WorkflowService,
};

#[derive(Parser)]
#[command(name = "workflow-engine")]
#[command(about = "Define finite-state workflows and drive their instances over HTTP")]
struct Cli {
    /// Configuration file (defaults to ./workflow-engine.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default)
    Serve {
        /// Interface to bind, overrides configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides configuration
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check a workflow definition JSON file without starting the service
    Validate {
        /// Path to the definition file
        file: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    EngineConfig::load_env_file()?;
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_required(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => EngineConfig::load()?,
    };

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            tokio::runtime::Runtime::new()?.block_on(serve_command(config))
        }
        Commands::Validate { file } => validate_command(&file),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn serve_command(config: EngineConfig) -> Result<()> {
    init_telemetry(&config.observability)?;

    let service = Arc::new(WorkflowService::in_memory());
    let result = run_server(service.clone(), &config.server).await;

    if config.observability.metrics_enabled {
        service.metrics().log_stats();
    }
    shutdown_telemetry();
    result
}

fn validate_command(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let def: WorkflowDefinition = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a workflow definition", file.display()))?;

    match validate_definition(&def) {
        Ok(()) => {
            println!(
                "✅ {} ({}): {} states, {} actions",
                def.id,
                def.name,
                def.states.len(),
                def.actions.len()
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("❌ {}: {} [{}]", def.id, e, e.kind()),
    }
}
