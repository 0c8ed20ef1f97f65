//! Configuration file format and the effective settings.
//!
//! Values given on the command line take precedence over the file, and the
//! file over built-in defaults.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lorawan_band::BandError;
use serde::Deserialize;

use crate::gateway::{FrequencyPlan, GatewayId, PoolConfig};

pub const DEFAULT_CONFIG_PATH: &str = "gateway-server.toml";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:1700";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_RETENTION_DAYS: u64 = 7;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid listen address {0:?}")]
    InvalidListen(String),

    /// A gateway entry names a band that does not exist.
    #[error("Gateway {gateway}: {source}")]
    Band {
        gateway: GatewayId,
        source: BandError,
    },

    #[error("Gateway {0} is configured more than once")]
    DuplicateGateway(GatewayId),
}

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub pool: PoolSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub gateways: Vec<GatewayEntry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub listen: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PoolSection {
    pub send_timeout_ms: Option<u64>,
    pub uplink_buffer: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

/// A gateway allowed to connect.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEntry {
    pub id: GatewayId,
    pub frequency_plan: String,
    /// Shared secret presented in the connection hello.
    pub token: String,
}

impl ConfigFile {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Check every gateway entry against the band registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.gateways {
            FrequencyPlan::new(&entry.frequency_plan)
                .band()
                .map_err(|source| ConfigError::Band {
                    gateway: entry.id.clone(),
                    source,
                })?;
            if !seen.insert(&entry.id) {
                return Err(ConfigError::DuplicateGateway(entry.id.clone()));
            }
        }
        Ok(())
    }
}

/// Command line values that override the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub send_timeout_ms: Option<u64>,
    pub uplink_buffer: Option<usize>,
    pub log_dir: Option<PathBuf>,
    pub log_retention_days: Option<u64>,
}

/// Effective settings after merging.
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: SocketAddr,
    pub pool: PoolConfig,
    pub log_dir: PathBuf,
    pub log_retention_days: u64,
    pub log_level: Option<String>,
    pub gateways: Vec<GatewayEntry>,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;

        let listen = match overrides.listen {
            Some(addr) => addr,
            None => {
                let listen = file.server.listen.as_deref().unwrap_or(DEFAULT_LISTEN);
                listen
                    .parse()
                    .map_err(|_| ConfigError::InvalidListen(listen.to_string()))?
            }
        };

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            send_timeout: overrides
                .send_timeout_ms
                .or(file.pool.send_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.send_timeout),
            uplink_buffer: overrides
                .uplink_buffer
                .or(file.pool.uplink_buffer)
                .unwrap_or(defaults.uplink_buffer),
        };

        Ok(Self {
            listen,
            pool,
            log_dir: overrides
                .log_dir
                .or_else(|| file.logging.log_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            log_retention_days: overrides
                .log_retention_days
                .or(file.logging.retention_days)
                .unwrap_or(DEFAULT_LOG_RETENTION_DAYS),
            log_level: file.logging.level,
            gateways: file.gateways,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[server]
listen = "127.0.0.1:1700"

[pool]
send_timeout_ms = 250

[logging]
level = "debug"

[[gateways]]
id = "G1"
frequency_plan = "EU_863_870"
token = "secret-1"

[[gateways]]
id = "G2"
frequency_plan = "KR_920_923"
token = "secret-2"
"#;

    #[test]
    fn test_parse_file() {
        let file = ConfigFile::parse(EXAMPLE).unwrap();
        assert_eq!(file.server.listen.as_deref(), Some("127.0.0.1:1700"));
        assert_eq!(file.gateways.len(), 2);
        assert_eq!(file.gateways[1].id.as_str(), "G2");
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::resolve(Overrides::default(), ConfigFile::parse("").unwrap()).unwrap();
        assert_eq!(settings.listen, DEFAULT_LISTEN.parse::<SocketAddr>().unwrap());
        assert_eq!(settings.pool.send_timeout, PoolConfig::default().send_timeout);
        assert_eq!(settings.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(settings.log_retention_days, DEFAULT_LOG_RETENTION_DAYS);
        assert!(settings.gateways.is_empty());
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let overrides = Overrides {
            listen: Some("0.0.0.0:1800".parse().unwrap()),
            uplink_buffer: Some(8),
            ..Default::default()
        };
        let settings = Settings::resolve(overrides, ConfigFile::parse(EXAMPLE).unwrap()).unwrap();
        assert_eq!(settings.listen.port(), 1800);
        assert_eq!(settings.pool.send_timeout, Duration::from_millis(250));
        assert_eq!(settings.pool.uplink_buffer, 8);
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_band_aborts() {
        let file = ConfigFile::parse(
            r#"
[[gateways]]
id = "G1"
frequency_plan = "XX_000"
token = "t"
"#,
        )
        .unwrap();
        assert!(matches!(
            Settings::resolve(Overrides::default(), file),
            Err(ConfigError::Band { source: BandError::NotFound(_), .. })
        ));
    }

    #[test]
    fn test_invalid_entries() {
        let duplicate = ConfigFile::parse(
            r#"
[[gateways]]
id = "G1"
frequency_plan = "EU_863_870"
token = "a"

[[gateways]]
id = "G1"
frequency_plan = "EU_863_870"
token = "b"
"#,
        )
        .unwrap();
        assert!(matches!(duplicate.validate(), Err(ConfigError::DuplicateGateway(_))));

        let blank_id = ConfigFile::parse(
            r#"
[[gateways]]
id = ""
frequency_plan = "EU_863_870"
token = "a"
"#,
        );
        assert!(matches!(blank_id, Err(ConfigError::Parse(_))));

        let bad_listen = ConfigFile::parse("[server]\nlisten = \"nowhere\"").unwrap();
        assert!(matches!(
            Settings::resolve(Overrides::default(), bad_listen),
            Err(ConfigError::InvalidListen(_))
        ));
    }
}
