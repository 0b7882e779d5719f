use anyhow::Result;
use clap::Parser;
use gemini_gateway::app::App;
use gemini_gateway::models::Config;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-gateway")]
#[command(about = "HTTP gateway for Gemini text, image, document and audio generation")]
struct CliArgs {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static front-end files (overrides STATIC_DIR).
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG set there reaches the filter.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(static_dir) = args.static_dir {
        config.static_dir = static_dir;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on port {}", config.port);

    App::from_config(&config)
        .serve(listener, shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from(["gemini-gateway", "--port", "8080", "--static-dir", "web"]);
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.static_dir.unwrap().to_string_lossy(), "web");
    }

    #[test]
    fn test_cli_defaults_to_environment() {
        let args = CliArgs::parse_from(["gemini-gateway"]);
        assert!(args.port.is_none());
        assert!(args.static_dir.is_none());
    }
}
