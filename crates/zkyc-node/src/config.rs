//! Node configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zkyc_core::ProtocolConfig;
use zkyc_prover::SnarkjsConfig;

/// Full configuration for the zkyc node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Protocol parameters: accounts, fees, reward split.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Proving backend selection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Payment rail settings.
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// How long a signed call stays acceptable, in seconds.
    #[serde(default = "default_max_request_age")]
    pub max_request_age_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// In-process development backend. Not zero-knowledge.
    #[default]
    Dev,
    /// External `snarkjs` with compiled circuit artifacts.
    Snarkjs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HasherChoice {
    #[default]
    Poseidon,
    Blake3,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
    /// Hash used by the development backend's circuit relations.
    #[serde(default)]
    pub hasher: HasherChoice,
    /// Artifact paths, required when `mode = "snarkjs"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snarkjs: Option<SnarkjsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Allow unauthenticated deposits on the internal rail.
    #[serde(default = "default_true")]
    pub allow_deposits: bool,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9001
}
fn default_max_request_age() -> u64 {
    300
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
            max_request_age_secs: default_max_request_age(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            allow_deposits: true,
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: NodeConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn api_socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.api.listen_addr, self.api.port).parse()?)
    }

    /// Reject configurations the node cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.protocol.validate()?;
        if self.backend.mode == BackendMode::Snarkjs && self.backend.snarkjs.is_none() {
            anyhow::bail!("backend.mode = \"snarkjs\" requires a [backend.snarkjs] section");
        }
        if self.api.max_request_age_secs == 0
            || self.api.max_request_age_secs > crate::auth::MAX_REQUEST_AGE_SECS
        {
            anyhow::bail!(
                "api.max_request_age_secs must be between 1 and {}",
                crate::auth::MAX_REQUEST_AGE_SECS
            );
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be \"text\" or \"json\"");
        }
        Ok(())
    }
}
