//! Configuration management for the Marginalia server

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub share: ShareConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    /// Frontend base URL; share links are `{frontend_url}?c={code}`
    pub frontend_url: String,
    pub ttl_days: i64,
    /// Maximum body size in UTF-8 bytes
    pub max_bytes: usize,
    /// Attempts at drawing an unused code
    pub code_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        ShareConfig {
            frontend_url: "http://localhost:5173".to_string(),
            ttl_days: 7,
            max_bytes: 500 * 1024,
            code_attempts: 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
            },
            database: DatabaseConfig {
                url: "sqlite:./marginalia.db".to_string(),
            },
            share: ShareConfig::default(),
            persistence: PersistenceConfig { debounce_ms: 300 },
        }
    }
}

impl Config {
    /// Read configuration from the process environment. Unset or
    /// unparsable variables fall back to their defaults one by one.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SERVER_PORT").unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            share: ShareConfig {
                frontend_url: lookup("FRONTEND_URL").unwrap_or(defaults.share.frontend_url),
                ttl_days: parse_var(&lookup, "SHARE_TTL_DAYS").unwrap_or(defaults.share.ttl_days),
                max_bytes: parse_var(&lookup, "SHARE_MAX_BYTES").unwrap_or(defaults.share.max_bytes),
                code_attempts: defaults.share.code_attempts,
            },
            persistence: PersistenceConfig {
                debounce_ms: parse_var(&lookup, "PERSIST_DEBOUNCE_MS")
                    .unwrap_or(defaults.persistence.debounce_ms),
            },
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_unset_frontend_url_keeps_other_settings() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite:/custom.db"),
            ("SERVER_PORT", "9000"),
            ("SHARE_TTL_DAYS", "3"),
        ]));

        assert_eq!(config.database.url, "sqlite:/custom.db");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.share.ttl_days, 3);
        assert_eq!(config.share.frontend_url, ShareConfig::default().frontend_url);
    }

    #[test]
    fn test_invalid_values_fall_back_individually() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "eighty"),
            ("SHARE_MAX_BYTES", "1024"),
            ("PERSIST_DEBOUNCE_MS", "-5"),
            ("FRONTEND_URL", "https://notes.example"),
        ]));

        assert_eq!(config.server.port, 8787);
        assert_eq!(config.share.max_bytes, 1024);
        assert_eq!(config.persistence.debounce(), Duration::from_millis(300));
        assert_eq!(config.share.frontend_url, "https://notes.example");
    }
}
