//! `photomesh` server binary.

mod config;

use clap::{Parser, Subcommand};
use photomesh_gateway::{ArtifactStorage, GatewayOptions, GatewayServer};
use photomesh_generation::build_generator;
use photomesh_session::InMemorySessionStore;
use photomesh_workflow::WorkflowController;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{PhotomeshConfig, API_KEY_ENV};

#[derive(Parser)]
#[command(name = "photomesh", about = "Photomesh: camera uploads to 3D models")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "photomesh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the config file and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = PhotomeshConfig::load(&cli.config).await?;
    config.apply_env_overrides(std::env::var(API_KEY_ENV).ok());

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(config, &host, port).await?;
        }
        Commands::CheckConfig => {
            println!("Config OK: {}", cli.config.display());
            println!("  static_dir:       {}", config.static_dir.display());
            println!("  listen:           {}:{}", config.server.host, config.server.port);
            println!("  max_upload_bytes: {}", config.server.max_upload_bytes);
            println!("  generator:        {:?}", config.generator.provider);
            if let Some(url) = &config.generator.base_url {
                println!("  base_url:         {url}");
            }
            if let Some(policy) = &config.generator.retry_policy {
                println!("  retries:          {}", policy.max_retries);
            }
        }
    }

    Ok(())
}

async fn serve(config: PhotomeshConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!("Starting Photomesh on {}:{}", host, port);

    let storage = Arc::new(ArtifactStorage::new(&config.static_dir).await?);
    info!(static_dir = %config.static_dir.display(), "Static storage ready");

    let generator = build_generator(&config.generator, storage.root())?;
    let sessions = Arc::new(InMemorySessionStore::new());
    let controller = Arc::new(WorkflowController::new(sessions, generator));

    let app = GatewayServer::build_with_options(
        controller,
        storage,
        GatewayOptions {
            max_upload_bytes: config.server.max_upload_bytes,
        },
    );

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Photomesh listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
