use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::comparison::ReconcileOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse {var} as {expected_type}: {source}")]
    ParseError {
        var: String,
        expected_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Where comparison rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Rpc,
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub rpc_url: Option<String>,
    pub api_key: Option<String>,
    pub rpc_function: String,
    pub snapshot_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Rpc,
            rpc_url: None,
            api_key: None,
            rpc_function: "get_comparison_data".to_string(),
            snapshot_path: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileConfig {
    pub normalize_plates: bool,
}

impl ReconcileConfig {
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            normalize_plates: self.normalize_plates,
        }
    }
}

/// Configuration for the user notice log
#[derive(Debug, Clone)]
pub struct NoticeConfig {
    pub notice_size: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self { notice_size: 200 }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub rust_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
        }
    }
}

/// Configuration for transport layer
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub transport: String,
    pub bind_address: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Main configuration container
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source: SourceConfig,
    pub reconcile: ReconcileConfig,
    pub notice: NoticeConfig,
    pub log: LogConfig,
    pub transport: TransportConfig,
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read `RECON_MCP_*` variables without cross-field validation, so CLI
    /// flags can still fill in what the environment leaves out.
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // RECON_MCP_TRANSPORT
        if let Ok(transport) = std::env::var("RECON_MCP_TRANSPORT") {
            config.transport.transport = transport;
        }

        // RECON_MCP_BIND
        if let Ok(bind) = std::env::var("RECON_MCP_BIND") {
            config.transport.bind_address = bind;
        }

        // RECON_MCP_SOURCE
        if let Ok(kind) = std::env::var("RECON_MCP_SOURCE") {
            config.source.kind = match kind.to_lowercase().as_str() {
                "rpc" => SourceKind::Rpc,
                "snapshot" => SourceKind::Snapshot,
                other => {
                    return Err(ConfigError::InvalidValue {
                        var: "RECON_MCP_SOURCE".to_string(),
                        message: format!("unknown source '{other}', use 'rpc' or 'snapshot'"),
                    });
                }
            };
        }

        if let Ok(url) = std::env::var("RECON_MCP_RPC_URL") {
            config.source.rpc_url = Some(url);
        }

        if let Ok(key) = std::env::var("RECON_MCP_API_KEY") {
            config.source.api_key = Some(key);
        }

        if let Ok(function) = std::env::var("RECON_MCP_RPC_FUNCTION") {
            config.source.rpc_function = function;
        }

        if let Ok(path) = std::env::var("RECON_MCP_SNAPSHOT") {
            config.source.snapshot_path = Some(PathBuf::from(path));
        }

        // RECON_MCP_REQUEST_TIMEOUT
        if let Ok(timeout_str) = std::env::var("RECON_MCP_REQUEST_TIMEOUT") {
            config.source.request_timeout_secs =
                timeout_str.parse().map_err(|e| ConfigError::ParseError {
                    var: "RECON_MCP_REQUEST_TIMEOUT".to_string(),
                    expected_type: "u64".to_string(),
                    source: Box::new(e),
                })?;
        }

        // RECON_MCP_NORMALIZE_PLATES
        if let Ok(flag) = std::env::var("RECON_MCP_NORMALIZE_PLATES") {
            config.reconcile.normalize_plates = parse_flag(&flag);
        }

        // RECON_MCP_NOTICE_SIZE
        if let Ok(size_str) = std::env::var("RECON_MCP_NOTICE_SIZE") {
            config.notice.notice_size = size_str.parse().map_err(|e| ConfigError::ParseError {
                var: "RECON_MCP_NOTICE_SIZE".to_string(),
                expected_type: "usize".to_string(),
                source: Box::new(e),
            })?;
        }

        // RUST_LOG
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.log.rust_log = rust_log;
        }

        Ok(config)
    }

    /// Check cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RECON_MCP_REQUEST_TIMEOUT".to_string(),
                message: "timeout must be greater than 0".to_string(),
            });
        }

        if self.notice.notice_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RECON_MCP_NOTICE_SIZE".to_string(),
                message: "notice size must be greater than 0".to_string(),
            });
        }

        match self.source.kind {
            SourceKind::Rpc if self.source.rpc_url.is_none() => Err(ConfigError::InvalidValue {
                var: "RECON_MCP_RPC_URL".to_string(),
                message: "required when RECON_MCP_SOURCE=rpc".to_string(),
            }),
            SourceKind::Snapshot if self.source.snapshot_path.is_none() => {
                Err(ConfigError::InvalidValue {
                    var: "RECON_MCP_SNAPSHOT".to_string(),
                    message: "required when RECON_MCP_SOURCE=snapshot".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
