//! Boundary to the hosted aggregation procedure that joins the manual and
//! automatic streams and tags each row with its provenance.

mod rpc;
mod snapshot;

pub use rpc::RpcSource;
pub use snapshot::SnapshotSource;

use chrono::NaiveDate;
use std::future::Future;
use thiserror::Error;

use crate::comparison::LogEntry;
use crate::config::{SourceConfig, SourceKind};
use crate::types::LocationId;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unauthorized: check the api key")]
    Unauthorized,
    #[error("malformed rows: {0}")]
    Decode(String),
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("source misconfigured: {0}")]
    Config(String),
}

impl SourceError {
    /// The rows arrived but could not be understood, as opposed to the call failing.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Anything that can answer `get_comparison_data` for a location and day.
pub trait ComparisonSource: Send + Sync {
    fn get_comparison_data(
        &self,
        location: &LocationId,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<LogEntry>, SourceError>> + Send;
}

/// Source chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum AnySource {
    Rpc(RpcSource),
    Snapshot(SnapshotSource),
}

impl AnySource {
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        match config.kind {
            SourceKind::Rpc => {
                let url = config
                    .rpc_url
                    .clone()
                    .ok_or_else(|| SourceError::Config("rpc url is not set".to_string()))?;
                let source = RpcSource::new(
                    url,
                    config.api_key.clone(),
                    config.rpc_function.clone(),
                    config.request_timeout(),
                )?;
                Ok(Self::Rpc(source))
            }
            SourceKind::Snapshot => {
                let path = config.snapshot_path.clone().ok_or_else(|| {
                    SourceError::Config("snapshot path is not set".to_string())
                })?;
                Ok(Self::Snapshot(SnapshotSource::new(path)))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Rpc(source) => format!("rpc {}", source.endpoint()),
            Self::Snapshot(source) => format!("snapshot {}", source.path().display()),
        }
    }
}

impl ComparisonSource for AnySource {
    async fn get_comparison_data(
        &self,
        location: &LocationId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<LogEntry>, SourceError> {
        match self {
            Self::Rpc(source) => source.get_comparison_data(location, date).await,
            Self::Snapshot(source) => source.get_comparison_data(location, date).await,
        }
    }
}
