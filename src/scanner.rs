//! Remote scoring client.
//!
//! One timed attempt per call, no retries. Any failure mode -- refused
//! connection, timeout, non-success status, unparseable body -- collapses to
//! [`ScanOutcome::Unavailable`] and the gate falls open to local-only
//! classification. This client never returns an error to the caller.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::GuardConfig;
use crate::error::ScanError;
use crate::types::RemoteResponse;

/// Result of one remote scan attempt.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Scored(RemoteResponse),
    Unavailable,
}

impl ScanOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ScanOutcome::Unavailable)
    }
}

/// Request shape of the scoring contract.
#[derive(Debug, Serialize)]
pub struct SanitizeRequest<'a> {
    pub prompt: &'a str,
}

/// Seam for the remote scorer; the HTTP client is the production
/// implementation.
#[async_trait]
pub trait RemoteScanner: Send + Sync {
    async fn scan(&self, prompt: &str) -> ScanOutcome;
}

/// HTTP client for the scoring endpoint.
pub struct HttpScanner {
    client: reqwest::Client,
    sanitize_url: Url,
    health_url: Url,
    timeout: Duration,
}

impl HttpScanner {
    pub fn new(config: &GuardConfig) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(config.scan_timeout)
            .build()
            .map_err(ScanError::Client)?;
        Ok(Self {
            client,
            sanitize_url: config.sanitize_url(),
            health_url: config.health_url(),
            timeout: config.scan_timeout,
        })
    }

    /// Liveness probe. Success/failure only; consumed by external status
    /// surfaces, not by the gate path.
    pub async fn probe(&self) -> bool {
        match self.client.get(self.health_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl RemoteScanner for HttpScanner {
    async fn scan(&self, prompt: &str) -> ScanOutcome {
        let started = Instant::now();
        let request = SanitizeRequest { prompt };

        let response = match self
            .client
            .post(self.sanitize_url.clone())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "remote scan unavailable, proceeding with local checks"
                );
                return ScanOutcome::Unavailable;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "remote scan returned non-success");
            return ScanOutcome::Unavailable;
        }

        match response.json::<RemoteResponse>().await {
            Ok(parsed) => {
                tracing::debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "remote scan completed"
                );
                ScanOutcome::Scored(parsed)
            }
            Err(e) => {
                tracing::debug!(error = %e, "remote scan body unparseable");
                ScanOutcome::Unavailable
            }
        }
    }
}
