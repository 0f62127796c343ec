//! Replay target adapter
//!
//! The [`ReplayTarget`] trait is the seam between the dispatcher and the
//! outbound HTTP call, so tests and dry runs can substitute their own target.

pub mod http;

pub use http::HttpReplayTarget;

use crate::config::HeaderNames;
use crate::domain::{DispatchError, ReplayRecord};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

/// Content type of every replayed payload
pub const PAYLOAD_CONTENT_TYPE: &str = "application/xml";

/// Outbound request for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    /// Payload body
    pub body: String,

    /// Header name/value pairs, in send order
    pub headers: Vec<(String, String)>,
}

impl ReplayRequest {
    /// Builds the outbound request for a replay record
    ///
    /// Carries the provenance and business-key headers, the fixed source-host
    /// marker, the message identifier (empty when identifiers are reset) and
    /// two empty grouping placeholders.
    pub fn build(record: &ReplayRecord, names: &HeaderNames, source_host: &str) -> Self {
        let headers = vec![
            (names.provenance.clone(), record.provenance_header.clone()),
            (
                names.business_keys.clone(),
                record.business_key_header.clone(),
            ),
            (names.source_host.clone(), source_host.to_string()),
            (names.message_id.clone(), record.message_id.clone()),
            (names.group_id.clone(), String::new()),
            (names.group_sequence.clone(), String::new()),
        ];

        Self {
            body: record.payload.clone(),
            headers,
        }
    }

    /// Looks up a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Validated HTTP header map, content type included
    ///
    /// Both dispatch modes run this, so a record that cannot be sent also
    /// fails a test run.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidHeader`] for a name or value HTTP
    /// cannot carry.
    pub fn header_map(&self) -> Result<HeaderMap, DispatchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PAYLOAD_CONTENT_TYPE));

        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| DispatchError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| DispatchError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

/// Response summary from a successful replay call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, possibly truncated
    pub body: String,
}

/// Destination for replayed records
#[async_trait]
pub trait ReplayTarget: Send + Sync {
    /// Sends one request
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] on transport failure, timeout or a
    /// non-success status. Callers treat every error as recoverable.
    async fn send(&self, request: &ReplayRequest) -> Result<TargetResponse, DispatchError>;

    /// Where requests go, for logs and ledger details
    fn endpoint(&self) -> &str;
}
