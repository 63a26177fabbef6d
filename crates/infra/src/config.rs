//! Process configuration loaded from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use paytv_observability::LogFormat;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    Invalid(&'static str),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP listen address.
    pub http_addr: SocketAddr,
    /// Where the JSON-file stores live; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let http_addr = lookup("PAYTV_HTTP_ADDR")
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PAYTV_HTTP_ADDR"))?;

        let data_dir = lookup("PAYTV_DATA_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let log_format = match lookup("PAYTV_LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PAYTV_LOG_FORMAT"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            http_addr,
            data_dir,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.http_addr, DEFAULT_HTTP_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.data_dir, None);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = load(&[
            ("PAYTV_HTTP_ADDR", "127.0.0.1:9090"),
            ("PAYTV_DATA_DIR", "/var/lib/paytv"),
            ("PAYTV_LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.http_addr.port(), 9090);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/paytv")));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        assert_eq!(
            load(&[("PAYTV_HTTP_ADDR", "nope")]),
            Err(ConfigError::Invalid("PAYTV_HTTP_ADDR"))
        );
        assert_eq!(
            load(&[("PAYTV_LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid("PAYTV_LOG_FORMAT"))
        );
        assert_eq!(load(&[("PAYTV_DATA_DIR", "  ")]).unwrap().data_dir, None);
    }
}
