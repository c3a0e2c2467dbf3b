use anyhow::{Context, Result};
use clap::Parser;
use gemini_relay::config::Config;
use gemini_relay::server::{self, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Relay text prompts and audio files to Gemini")]
struct CliArgs {
    /// Address to bind, overriding RELAY_HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding RELAY_PORT.
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not found in environment variables or .env file");
        warn!("The relay will answer every request with a configuration error");
    }

    let addr = config.bind_addr();
    let app = server::router(AppState::from_config(config, reqwest::Client::new()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("gemini-relay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn test_parse_port_override() {
        let args = CliArgs::try_parse_from(["gemini-relay", "--port", "8080"]).unwrap();
        assert_eq!(args.port, Some(8080));
        assert!(args.host.is_none());
    }

    #[test]
    fn test_parse_rejects_invalid_port() {
        assert!(CliArgs::try_parse_from(["gemini-relay", "--port", "http"]).is_err());
    }
}
