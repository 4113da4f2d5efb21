//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `BOOKREC_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{DEFAULT_MAX_K, DEFAULT_TOP_K};

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `BOOKREC_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory holding raw and cleaned CSV files. Default: `./data`.
    pub data_dir: PathBuf,

    /// Directory holding the model, encoder and mask artifacts. Default: `./explicit_model`.
    pub artifact_dir: PathBuf,

    /// Result count used when a request omits `k`. Default: `10`.
    pub default_k: usize,

    /// Largest `k` the gateway accepts. Default: `1000`.
    pub max_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            data_dir: PathBuf::from("./data"),
            artifact_dir: PathBuf::from("./explicit_model"),
            default_k: DEFAULT_TOP_K,
            max_k: DEFAULT_MAX_K,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "BOOKREC_PORT";
    const ENV_BIND_ADDR: &'static str = "BOOKREC_BIND_ADDR";
    const ENV_DATA_DIR: &'static str = "BOOKREC_DATA_DIR";
    const ENV_ARTIFACT_DIR: &'static str = "BOOKREC_ARTIFACT_DIR";
    const ENV_DEFAULT_K: &'static str = "BOOKREC_DEFAULT_K";
    const ENV_MAX_K: &'static str = "BOOKREC_MAX_K";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port: u16 = parse_from_env(Self::ENV_PORT, defaults.port)?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_PORT,
                reason: "port 0 cannot be bound explicitly".to_string(),
            });
        }

        Ok(Self {
            port,
            bind_addr: parse_from_env(Self::ENV_BIND_ADDR, defaults.bind_addr)?,
            data_dir: path_from_env(Self::ENV_DATA_DIR, defaults.data_dir),
            artifact_dir: path_from_env(Self::ENV_ARTIFACT_DIR, defaults.artifact_dir),
            default_k: parse_from_env(Self::ENV_DEFAULT_K, defaults.default_k)?,
            max_k: parse_from_env(Self::ENV_MAX_K, defaults.max_k)?,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, dir) in [
            (Self::ENV_DATA_DIR, &self.data_dir),
            (Self::ENV_ARTIFACT_DIR, &self.artifact_dir),
        ] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory {
                    name,
                    path: dir.clone(),
                });
            }
        }

        if self.default_k == 0 || self.max_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_DEFAULT_K,
                reason: "result counts must be at least 1".to_string(),
            });
        }

        if self.default_k > self.max_k {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_DEFAULT_K,
                reason: format!(
                    "default k ({}) exceeds max k ({})",
                    self.default_k, self.max_k
                ),
            });
        }

        Ok(())
    }

    /// Serving additionally needs a trained artifact directory.
    pub fn validate_for_serving(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if !self.artifact_dir.exists() {
            return Err(ConfigError::MissingDirectory {
                name: Self::ENV_ARTIFACT_DIR,
                path: self.artifact_dir.clone(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Unset or blank means `default`; surrounding whitespace is trimmed.
fn path_from_env(name: &str, default: PathBuf) -> PathBuf {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

/// Parses `name` as `T`; unset or blank means `default`.
pub(crate) fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::Unparsable {
                    name,
                    value: value.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
