//! Server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file (`flock.toml`, or the path in `FLOCK_CONFIG`), then
//! environment variables such as `FLOCK__HTTP__BIND` or
//! `FLOCK__DATABASE__URL`.

use config::{Config, ConfigError, Environment, File};
use flock_db::DbConfig;
use flock_scheduling::SchedulingConfig;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "flock.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub database: DbConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
        }
    }
}

impl ServerConfig {
    /// Load from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("FLOCK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&path)
    }

    /// Load from `path` (skipped if absent) and the environment.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("FLOCK").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServerConfig::from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.http.bind, "0.0.0.0:8080");
        assert_eq!(config.database.namespace, "flock");
        assert_eq!(config.scheduling.transaction_timeout_ms, 10_000);
        assert!(
            config
                .scheduling
                .sensitive_category_keywords
                .iter()
                .any(|k| k == "nursery")
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = std::env::temp_dir().join(format!("flock-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("flock.toml");
        std::fs::write(
            &path,
            "[http]\nbind = \"127.0.0.1:9000\"\n\n\
             [scheduling]\ntransaction_timeout_ms = 2500\n",
        )
        .unwrap();

        let config = ServerConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.http.bind, "127.0.0.1:9000");
        assert_eq!(config.scheduling.transaction_timeout_ms, 2500);
        assert_eq!(config.database.database, "main");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
