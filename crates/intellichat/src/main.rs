use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intellichat::chat::ProviderBackend;
use intellichat::cli::{self, ChatOptions};
use intellichat::config::Config;
use intellichat::keys::KeyStore;
use intellichat::server::{AppState, build_app};
use intellichat_types::ProviderName;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intellichat", version, about = "Chat gateway for hosted LLM providers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Path to the YAML config file
        #[arg(short, long, default_value = "intellichat.yaml")]
        config: PathBuf,

        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with a running gateway from the terminal
    Chat {
        /// Gateway base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,

        #[arg(long, default_value = "openai")]
        provider: ProviderName,

        /// Provider API key sent with each request (else the server's key is used)
        #[arg(long, env = "INTELLICHAT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        system_message: Option<String>,

        /// Candidate replies to request; the first is shown
        #[arg(short, long, default_value_t = 1)]
        n: u32,

        /// Select relevant history by embedding similarity
        #[arg(long)]
        with_context: bool,

        /// Shared one-key, unlocks server default keys
        #[arg(long, env = "INTELLI_ONE_KEY", hide_env_values = true)]
        one_key: Option<String>,

        /// Search documents uploaded under the one-key
        #[arg(long, requires = "one_key")]
        documents: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Serve { config, host, port } => serve(config, host, port).await,
        Command::Chat {
            url,
            provider,
            api_key,
            model,
            system_message,
            n,
            with_context,
            one_key,
            documents,
        } => {
            cli::run(ChatOptions {
                url,
                provider,
                api_key,
                model,
                system_message,
                n,
                with_context,
                one_key,
                documents,
            })
            .await
        }
    }
}

async fn serve(config_path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(path = %config_path.display(), "Loaded configuration");

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let keys = KeyStore::from_env();
    let backend = ProviderBackend::new(&config);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let request_timeout = config.server.request_timeout_seconds;

    let state = AppState {
        config: Arc::new(config),
        keys: Arc::new(keys),
        backend: Arc::new(backend),
    };
    let app = build_app(state, request_timeout);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    info!("Listening on {bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!(error = %e, "Failed to listen for ctrl-c"),
    }
}
