use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{ComparisonSource, SourceError};
use crate::comparison::LogEntry;
use crate::types::LocationId;

/// Calls the aggregation procedure through the database's REST RPC endpoint.
/// Failures are returned as-is; retrying is left to the operator.
#[derive(Debug, Clone)]
pub struct RpcSource {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    p_location_id: &'a str,
    p_filter_date: Option<String>,
}

impl RpcSource {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        function: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recon-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let endpoint = format!(
            "{}/rest/v1/rpc/{}",
            base_url.trim_end_matches('/'),
            function
        );

        tracing::info!("RPC source targets {endpoint}");

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ComparisonSource for RpcSource {
    async fn get_comparison_data(
        &self,
        location: &LocationId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<LogEntry>, SourceError> {
        let params = RpcParams {
            p_location_id: location.as_str(),
            p_filter_date: date.map(|d| d.format("%Y-%m-%d").to_string()),
        };

        tracing::debug!(
            "Calling {} with location={}, date={:?}",
            self.endpoint,
            params.p_location_id,
            params.p_filter_date
        );

        let mut request = self.http.post(&self.endpoint).json(&params);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let res = request.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let rows = res
                    .json::<Vec<LogEntry>>()
                    .await
                    .map_err(|e| SourceError::Decode(e.to_string()))?;
                tracing::debug!("RPC returned {} rows", rows.len());
                Ok(rows)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unauthorized),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(SourceError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(e.to_string())
    }
}
