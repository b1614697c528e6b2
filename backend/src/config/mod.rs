//! Server configuration from the environment.
//!
//! A `.env` file is loaded first (if present), then these variables are read:
//!
//! | Variable        | Default                      |
//! |-----------------|------------------------------|
//! | `DR_HOST`       | `0.0.0.0`                    |
//! | `DR_PORT`       | `5000`                       |
//! | `DR_DATABASE`   | `data/DisasterResponse.db`   |
//! | `DR_TABLE`      | `dataset`                    |
//! | `DR_MODEL_PATH` | `models/classifier.json`     |
//! | `DR_MODEL_URL`  | unset (no download)          |
//! | `DR_STATIC_DIR` | unset (no static files)      |
//!
//! Command-line flags override any of these.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::store::DEFAULT_TABLE;

#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub table: String,
    pub model_path: PathBuf,
    pub model_url: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database: PathBuf::from("data/DisasterResponse.db"),
            table: DEFAULT_TABLE.to_string(),
            model_path: PathBuf::from("models/classifier.json"),
            model_url: None,
            static_dir: None,
        }
    }
}

impl ServeConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get("DR_HOST").unwrap_or(defaults.host),
            port: get("DR_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            database: get("DR_DATABASE").map(PathBuf::from).unwrap_or(defaults.database),
            table: get("DR_TABLE").unwrap_or(defaults.table),
            model_path: get("DR_MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            model_url: get("DR_MODEL_URL"),
            static_dir: get("DR_STATIC_DIR").map(PathBuf::from),
        }
    }

    /// Socket address to bind, falling back to all interfaces.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = ServeConfig::from_lookup(|_| None);
        assert_eq!(config, ServeConfig::default());
        assert_eq!(config.socket_addr().port(), 5000);
    }

    #[test]
    fn test_values_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("DR_HOST", "127.0.0.1"),
            ("DR_PORT", "8080"),
            ("DR_DATABASE", "/tmp/dr.db"),
            ("DR_MODEL_URL", "https://example.org/model.zip"),
            ("DR_STATIC_DIR", ""),
        ]
        .into_iter()
        .collect();
        let config = ServeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.socket_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database, PathBuf::from("/tmp/dr.db"));
        assert_eq!(config.model_url.as_deref(), Some("https://example.org/model.zip"));
        assert_eq!(config.static_dir, None);
        assert_eq!(config.table, "dataset");
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = ServeConfig::from_lookup(|k| (k == "DR_PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 5000);
    }
}
