//! OAP Gateway - CLI Application
//!
//! Runs the gateway server, validates configuration files and writes a
//! sample configuration.

use clap::{Parser, Subcommand};
use oap_gateway::{
    config::GatewayConfig,
    server::{router, AppState},
};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// OAP Gateway - forwards browser requests to an MCP backend
#[derive(Parser)]
#[command(name = "oap-gateway")]
#[command(version, about = "A reverse-proxy gateway for an MCP backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Validate the configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Generate a sample configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => start_server(&config).await?,
        Commands::Validate { config } => validate_config(&config)?,
        Commands::Init { output } => generate_sample_config(&output)?,
    }

    Ok(())
}

/// Start the gateway server
async fn start_server(config_path: &str) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = GatewayConfig::from_file(config_path)?;
    info!("Loaded configuration from {}", config_path);

    match &config.gateway.backend_url {
        Some(url) => info!("Backend: {}", url),
        None => warn!("No backend URL configured; proxied requests will fail until one is set"),
    }
    if config.gateway.auth_required {
        info!(
            "Authorization required; identity sent in {}",
            config.gateway.identity_header
        );
        if config.gateway.api_key.is_none() {
            warn!("Authorization is required but no API key is configured");
        }
    }

    let addr: SocketAddr = config.server_addr().parse()?;
    let app = router(AppState::new(config)?);

    info!("Starting gateway server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Validate configuration file
fn validate_config(config_path: &str) -> anyhow::Result<()> {
    match GatewayConfig::from_file(config_path) {
        Ok(config) => {
            let gateway = &config.gateway;
            println!("✓ Configuration is valid!");
            println!();
            println!("Server: {}", config.server_addr());
            println!("Prefix: {}", gateway.prefix);
            println!(
                "Backend: {}",
                gateway.backend_url.as_deref().unwrap_or("(not configured)")
            );
            println!("Timeout: {}s", gateway.timeout);
            println!();
            if gateway.auth_required {
                println!("Authorization: required");
                println!(
                    "  API key: {}",
                    if gateway.api_key.is_some() { "set" } else { "MISSING" }
                );
                println!(
                    "  Session header: {}",
                    gateway.session_header.as_deref().unwrap_or("(none)")
                );
                println!(
                    "  Fallback identity: {}",
                    gateway.fallback_identity.as_deref().unwrap_or("(none)")
                );
                println!("  Identity header: {}", gateway.identity_header);
            } else {
                println!("Authorization: disabled");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration is invalid:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

/// Generate sample configuration file
fn generate_sample_config(output_path: &str) -> anyhow::Result<()> {
    let sample_config = r#"# OAP Gateway Configuration

[server]
host = "0.0.0.0"
port = 8080

[gateway]
# Inbound path prefix; everything after it is appended to backend_url
prefix = "/api/oap_mcp"
# Full URL of the backend, e.g. an MCP gateway endpoint (env: GATEWAY_BACKEND_URL)
backend_url = "http://localhost:8001/mcp/my-gateway"
# Outbound timeout in seconds
timeout = 30

# Inject "Authorization: Bearer <api_key>" and the caller identity (env: GATEWAY_AUTH_REQUIRED)
auth_required = false
# api_key = "..."                   # env: GATEWAY_API_KEY
# fallback_identity = "ops@example.com"  # env: GATEWAY_FALLBACK_IDENTITY
# Trusted header set by an authenticating front proxy
# session_header = "X-Forwarded-Email"
identity_header = "Arcade-User-ID"

[metrics]
enabled = true
path = "/metrics"

[health]
enabled = true
path = "/health"
"#;

    std::fs::write(output_path, sample_config)?;
    println!("Sample configuration written to {}", output_path);
    Ok(())
}
