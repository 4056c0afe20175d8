//! Run the case and history store server

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rehearse_server::{RehearseServer, ServerConfig, TokenValidator};
use tracing::info;

use crate::config::RehearseConfig;

const MISSING_SECRET: &str =
    "no token secret configured; set REHEARSE_JWT_SECRET or [server] jwt_secret";

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on [default: from config, 8000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to [default: from config, 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Database file; history is kept in memory when unset
    #[arg(long)]
    pub database: Option<PathBuf>,
}

/// Run the server in the foreground
pub async fn run(args: ServeArgs, config: &RehearseConfig) -> Result<()> {
    let server_config = server_config(&args, config);
    let secret = config.server.jwt_secret().context(MISSING_SECRET)?;
    let validator = TokenValidator::new(&secret).with_leeway(config.server.token_leeway_seconds);

    info!(
        "starting rehearse server on {}:{}",
        server_config.host, server_config.port
    );

    let server = RehearseServer::open(server_config, validator)
        .await
        .context("failed to open the store database")?;
    server.run().await?;
    Ok(())
}

/// Command-line flags override the `[server]` section
fn server_config(args: &ServeArgs, config: &RehearseConfig) -> ServerConfig {
    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let mut server_config = ServerConfig::new(host, port);
    let database = args.database.as_ref().or(config.server.database.as_ref());
    if let Some(database) = database {
        server_config = server_config.with_database(database.clone());
    }
    server_config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            port: None,
            host: None,
            database: None,
        }
    }

    #[test]
    fn test_defaults_come_from_config() {
        let mut config = RehearseConfig::default();
        config.server.port = 9300;
        config.server.database = Some(PathBuf::from("store.db"));

        let server_config = server_config(&args(), &config);
        assert_eq!(server_config.addr(), "127.0.0.1:9300");
        assert_eq!(server_config.database, Some(PathBuf::from("store.db")));
    }

    #[test]
    fn test_flags_override_config() {
        let config = RehearseConfig::default();
        let args = ServeArgs {
            port: Some(7000),
            host: Some("0.0.0.0".to_string()),
            database: Some(PathBuf::from("/tmp/other.db")),
        };

        let server_config = server_config(&args, &config);
        assert_eq!(server_config.addr(), "0.0.0.0:7000");
        assert_eq!(server_config.database, Some(PathBuf::from("/tmp/other.db")));
    }

    #[tokio::test]
    async fn test_missing_secret_is_an_error() {
        let err = run(args(), &RehearseConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("REHEARSE_JWT_SECRET"));
    }
}
