//! HTTP replay target
//!
//! POSTs each payload to the URL resolved from the target table.

use super::{ReplayRequest, ReplayTarget, TargetResponse};
use crate::config::ReplayConfig;
use crate::domain::{DispatchError, ResendError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Maximum response body kept for ledger details
const MAX_BODY_CHARS: usize = 512;

/// Replay target reached over HTTP
pub struct HttpReplayTarget {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpReplayTarget {
    /// Create a target for `url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, config: &ReplayConfig) -> Result<Self> {
        let url = url.into();
        let mut builder = ClientBuilder::new().connect_timeout(Duration::from_secs(10));

        if !config.tls_verify {
            tracing::warn!(url = %url, "TLS certificate verification is DISABLED for the replay target");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            ResendError::Configuration(format!("Failed to build replay HTTP client: {e}"))
        })?;

        Ok(Self {
            url,
            client,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }
}

#[async_trait]
impl ReplayTarget for HttpReplayTarget {
    async fn send(&self, request: &ReplayRequest) -> std::result::Result<TargetResponse, DispatchError> {
        let headers = request.header_map()?;

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout(e.to_string())
                } else {
                    DispatchError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        let body: String = match resp.text().await {
            Ok(text) => text.chars().take(MAX_BODY_CHARS).collect(),
            Err(e) => {
                tracing::debug!(url = %self.url, status = %status, error = %e, "Failed to read replay response body");
                String::new()
            }
        };

        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(TargetResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
