//! `cors-proxy`: a reverse proxy that adds CORS headers for allowed origins.
//!
//! ```text
//! cors-proxy [--port <port>] [--listen <ip>] <allowed_origins> <backend_url>
//! cors-proxy --config proxy.toml [--port <port>] [--listen <ip>]
//! ```

use std::path::PathBuf;

use clap::Parser;

use cors_proxy::config::{config_from_args, load_config, ProxyConfig};
use cors_proxy::lifecycle::{signals, startup, Shutdown};
use cors_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "cors-proxy")]
#[command(about = "Reverse proxy that injects CORS headers for allowed origins", long_about = None)]
struct Cli {
    /// Port to listen on [default: 4001]
    #[arg(short, long)]
    port: Option<u16>,

    /// IP address to listen on [default: localhost]
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML configuration file with routes
    #[arg(short, long, conflicts_with_all = ["allowed_origins", "backend_url"])]
    config: Option<PathBuf>,

    /// Comma-separated list of allowed origins ("*" allows any)
    #[arg(required_unless_present = "config", requires = "backend_url")]
    allowed_origins: Option<String>,

    /// Backend URL every request is forwarded to
    #[arg(required_unless_present = "config")]
    backend_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, cors_proxy::config::ConfigError> {
        let mut config = match (&self.config, &self.allowed_origins, &self.backend_url) {
            (Some(path), _, _) => load_config(path)?,
            (None, Some(origins), Some(backend)) => config_from_args(origins, backend)?,
            // clap enforces one of the two forms
            _ => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(listen) = self.listen {
            config.listener.listen = listen;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_form() {
        let cli = Cli::try_parse_from([
            "cors-proxy",
            "--port",
            "8080",
            "https://a.test,https://b.test",
            "http://127.0.0.1:3000",
        ])
        .unwrap();

        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.bind_address(), "localhost:8080");
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.backend.as_deref(), Some("http://127.0.0.1:3000"));
    }

    #[test]
    fn requires_origins_and_backend() {
        assert!(Cli::try_parse_from(["cors-proxy"]).is_err());
        assert!(Cli::try_parse_from(["cors-proxy", "https://a.test"]).is_err());
    }

    #[test]
    fn config_conflicts_with_positionals() {
        assert!(Cli::try_parse_from([
            "cors-proxy",
            "--config",
            "proxy.toml",
            "https://a.test",
            "http://b:80",
        ])
        .is_err());
    }

    #[test]
    fn invalid_backend_is_rejected_at_startup() {
        let cli = Cli::try_parse_from(["cors-proxy", "*", "::bad::"]).unwrap();
        assert!(cli.into_config().is_err());
    }
}
