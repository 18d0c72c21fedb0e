use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use meraki_assistant::{
    AssistantConfig, DiagnosisRequest, DiagnosticEngine, HealthCheckEngine, HttpGateway,
    MerakiServer,
};

/// Meraki Assistant: troubleshooting and health checks for Cisco Meraki networks
#[derive(Parser, Debug)]
#[command(name = "meraki-assistant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server over stdio (default)
    #[command(name = "serve")]
    Serve,

    /// Diagnose a connectivity issue and print the report as JSON
    #[command(name = "diagnose")]
    Diagnose {
        /// Organization ID
        #[arg(short, long)]
        organization: String,

        /// Description of the connectivity issue
        #[arg(short, long)]
        issue: String,

        /// Network ID to check in detail
        #[arg(short, long)]
        network: Option<String>,

        /// Device serial to check in detail
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Run an organization health check and print the report as JSON
    #[command(name = "health-check")]
    HealthCheck {
        /// Organization ID
        #[arg(short, long)]
        organization: String,

        /// Leave recommendations out of the report
        #[arg(long)]
        no_recommendations: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP protocol, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => handle_serve_command(config).await,
        Command::Diagnose {
            organization,
            issue,
            network,
            device,
        } => {
            let request = DiagnosisRequest {
                organization_id: organization,
                issue_description: issue,
                network_id: network,
                device_serial: device,
            };
            handle_diagnose_command(config, request).await
        }
        Command::HealthCheck {
            organization,
            no_recommendations,
        } => handle_health_check_command(config, &organization, !no_recommendations).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AssistantConfig> {
    let path = match path {
        Some(p) => Some(p.clone()),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            AssistantConfig::auto_detect(&cwd)
        }
    };

    if let Some(p) = &path {
        info!("Loading configuration from {:?}", p);
    }

    AssistantConfig::load_with_env(path.as_ref())
        .context(format!("Failed to load configuration from {:?}", path))
}

fn http_gateway(config: &AssistantConfig) -> Result<HttpGateway> {
    HttpGateway::from_config(&config.api)
        .ok_or_else(|| anyhow::anyhow!("MERAKI_API_KEY environment variable not set"))
}

async fn handle_serve_command(config: AssistantConfig) -> Result<()> {
    info!("Starting Meraki MCP server on stdio");

    let service = MerakiServer::with_config(config)
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;
    service.waiting().await?;

    info!("MCP server stopped");
    Ok(())
}

async fn handle_diagnose_command(config: AssistantConfig, request: DiagnosisRequest) -> Result<()> {
    let gateway = http_gateway(&config)?;
    let report = DiagnosticEngine::new(&gateway).diagnose(&request).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn handle_health_check_command(
    config: AssistantConfig,
    organization_id: &str,
    include_recommendations: bool,
) -> Result<()> {
    let gateway = http_gateway(&config)?;
    let report = HealthCheckEngine::with_config(&gateway, config.health_check.clone())
        .health_check(organization_id, include_recommendations)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
