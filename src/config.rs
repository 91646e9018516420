//! Configuration management for helpdesk.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every setting has a default so the server starts with no
//! environment at all.

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix every API route is nested under.
    pub api_prefix: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Tickets, projects and comments.
    pub path: String,
    /// User accounts. Kept in a separate file from the ticket data.
    pub auth_path: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            server: ServerConfig {
                host: get("HOST", "0.0.0.0"),
                port: parse_or("PORT", lookup("PORT"), 4000),
                api_prefix: normalize_prefix(&get("API_PREFIX", "/api")),
            },
            database: DatabaseConfig {
                path: get("DATABASE_PATH", "./data/app.db"),
                auth_path: get("AUTH_DATABASE_PATH", "./data/auth.db"),
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    lookup("DATABASE_MAX_CONNECTIONS"),
                    10,
                ),
            },
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %value, default = %default, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}

/// Ensure a leading slash and no trailing slash. An empty prefix mounts at root.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(config.database.path, "./data/app.db");
        assert_eq!(config.database.auth_path, "./data/auth.db");
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("API_PREFIX", "v1/"),
            ("AUTH_DATABASE_PATH", "/tmp/users.db"),
        ]));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_prefix, "/v1");
        assert_eq!(config.database.auth_path, "/tmp/users.db");
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("DATABASE_MAX_CONNECTIONS", "-3"),
        ]));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_empty_prefix_mounts_at_root() {
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/api"), "/api");
    }
}
