use std::{net::SocketAddr, time::Duration};

use chrono::TimeDelta;
use clap::Parser;
use taskdeck::{AuthSettings, StoreBuilder};

/// Runtime configuration. Every flag falls back to an environment variable, and
/// `main` loads a `.env` file first when one exists.
#[derive(Parser, Debug, Clone)]
#[command(name = "taskdeck-server", version, about = "TaskDeck REST API server")]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "TASKDECK_BIND", default_value = "0.0.0.0:4000")]
    pub bind: SocketAddr,

    /// SeaORM connection string.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./taskdeck.db?mode=rwc")]
    pub database_url: String,

    /// Upper bound on pooled database connections. Unset keeps the driver default.
    #[arg(long, env = "TASKDECK_MAX_CONNECTIONS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_connections: Option<u32>,

    /// Seconds to wait for a database connection before giving up.
    #[arg(long, env = "TASKDECK_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// HMAC secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, value_parser = non_empty)]
    pub jwt_secret: String,

    /// Bearer token lifetime in hours.
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..))]
    pub token_ttl_hours: u32,
}

impl ServerConfig {
    pub fn store_builder(&self) -> StoreBuilder {
        let builder = StoreBuilder::new(&self.database_url)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs));
        match self.max_connections {
            Some(max) => builder.with_max_connections(max),
            None => builder,
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings::new(self.jwt_secret.clone())
            .with_token_ttl(TimeDelta::hours(i64::from(self.token_ttl_hours)))
    }
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = ServerConfig::try_parse_from([
            "taskdeck-server",
            "--bind",
            "127.0.0.1:8080",
            "--database-url",
            "sqlite::memory:",
            "--jwt-secret",
            "s3cret",
            "--token-ttl-hours",
            "2",
        ])
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.auth_settings().token_ttl, TimeDelta::hours(2));
        assert_eq!(config.auth_settings().jwt_secret, "s3cret");
        assert_eq!(config.max_connections, None);
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_pool_flags_reach_the_store() {
        let config = ServerConfig::try_parse_from([
            "taskdeck-server",
            "--database-url",
            "sqlite::memory:",
            "--jwt-secret",
            "s3cret",
            "--max-connections",
            "3",
            "--connect-timeout-secs",
            "1",
        ])
        .unwrap();
        assert_eq!(config.max_connections, Some(3));
        assert_eq!(config.connect_timeout_secs, 1);

        let store = config.store_builder().build().await.unwrap();
        store.migrate().await.unwrap();
        store.close().await.unwrap();

        let zero = ServerConfig::try_parse_from([
            "taskdeck-server",
            "--jwt-secret",
            "s3cret",
            "--max-connections",
            "0",
        ]);
        assert!(zero.is_err());
    }

    #[test]
    fn test_blank_secret_and_zero_ttl_are_rejected() {
        let blank = ServerConfig::try_parse_from(["taskdeck-server", "--jwt-secret", "  "]);
        assert!(blank.is_err());

        let zero_ttl = ServerConfig::try_parse_from([
            "taskdeck-server",
            "--jwt-secret",
            "s3cret",
            "--token-ttl-hours",
            "0",
        ]);
        assert!(zero_ttl.is_err());
    }
}
