//! Per-record dispatch
//!
//! Every call produces exactly one [`LedgerEntry`]. Target failures are an
//! ordinary `Err` branch here and never escape the dispatcher.

use super::summary::{LedgerEntry, LedgerOutcome};
use crate::adapters::target::{ReplayRequest, ReplayTarget};
use crate::config::HeaderNames;
use crate::domain::ReplayRecord;
use std::fmt;
use std::sync::Arc;

/// What happens to each record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    /// Build the request but do not send it
    Test,
    /// Send to the target
    Send,
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => f.write_str("test"),
            Self::Send => f.write_str("send"),
        }
    }
}

/// Sends (or dry-runs) replay records against one target
pub struct Dispatcher {
    action: DispatchAction,
    target: Arc<dyn ReplayTarget>,
    headers: HeaderNames,
    source_host: String,
}

impl Dispatcher {
    pub fn new(
        action: DispatchAction,
        target: Arc<dyn ReplayTarget>,
        headers: HeaderNames,
        source_host: impl Into<String>,
    ) -> Self {
        Self {
            action,
            target,
            headers,
            source_host: source_host.into(),
        }
    }

    pub fn action(&self) -> DispatchAction {
        self.action
    }

    pub fn endpoint(&self) -> &str {
        self.target.endpoint()
    }

    /// Dispatches one record and returns its ledger entry
    pub async fn dispatch(&self, record: &ReplayRecord) -> LedgerEntry {
        let request = ReplayRequest::build(record, &self.headers, &self.source_host);

        if self.action == DispatchAction::Test {
            if let Err(e) = request.header_map() {
                tracing::warn!(record_id = %record.id, error = %e, "Test mode, request could not be sent");
                return LedgerEntry::new(LedgerOutcome::Error, record.id.clone(), e.to_string());
            }
            tracing::debug!(
                record_id = %record.id,
                payload_bytes = request.body.len(),
                "Test mode, request not sent"
            );
            return LedgerEntry::new(
                LedgerOutcome::TestOk,
                record.id.clone(),
                format!("{} byte(s) not sent", request.body.len()),
            );
        }

        match self.target.send(&request).await {
            Ok(response) => {
                tracing::debug!(
                    record_id = %record.id,
                    status = response.status,
                    "Record replayed"
                );
                LedgerEntry::new(
                    LedgerOutcome::Ok,
                    record.id.clone(),
                    format!("HTTP {}", response.status),
                )
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id,
                    endpoint = %self.target.endpoint(),
                    error = %e,
                    "Replay failed"
                );
                LedgerEntry::new(LedgerOutcome::Error, record.id.clone(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::target::TargetResponse;
    use crate::domain::{DispatchError, RecordId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTarget {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ReplayTarget for CountingTarget {
        async fn send(&self, _request: &ReplayRequest) -> Result<TargetResponse, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DispatchError::Rejected {
                    status: 500,
                    message: "boom".to_string(),
                })
            } else {
                Ok(TargetResponse {
                    status: 200,
                    body: String::new(),
                })
            }
        }

        fn endpoint(&self) -> &str {
            "stub://target"
        }
    }

    fn record() -> ReplayRecord {
        ReplayRecord {
            id: RecordId::new("doc-1").unwrap(),
            payload: "<Envelope/>".to_string(),
            provenance_header: String::new(),
            business_key_header: String::new(),
            message_id: String::new(),
        }
    }

    fn dispatcher(action: DispatchAction, fail: bool) -> (Arc<CountingTarget>, Dispatcher) {
        let target = Arc::new(CountingTarget {
            calls: AtomicUsize::new(0),
            fail,
        });
        let dispatcher = Dispatcher::new(action, target.clone(), HeaderNames::default(), "resend");
        (target, dispatcher)
    }

    #[tokio::test]
    async fn test_send_success() {
        let (target, dispatcher) = dispatcher(DispatchAction::Send, false);
        let entry = dispatcher.dispatch(&record()).await;

        assert_eq!(entry.outcome, LedgerOutcome::Ok);
        assert_eq!(entry.detail, "HTTP 200");
        assert_eq!(target.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_failure_becomes_error_entry() {
        let (_target, dispatcher) = dispatcher(DispatchAction::Send, true);
        let entry = dispatcher.dispatch(&record()).await;

        assert_eq!(entry.outcome, LedgerOutcome::Error);
        assert_eq!(entry.record_id.as_str(), "doc-1");
        assert!(entry.detail.contains("500"));
    }

    #[tokio::test]
    async fn test_test_mode_never_calls_target() {
        let (target, dispatcher) = dispatcher(DispatchAction::Test, true);
        let entry = dispatcher.dispatch(&record()).await;

        assert_eq!(entry.outcome, LedgerOutcome::TestOk);
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_test_mode_rejects_unsendable_headers() {
        let (target, dispatcher) = dispatcher(DispatchAction::Test, false);
        let mut record = record();
        record.message_id = "m-1\r\nX-Injected: yes".to_string();

        let entry = dispatcher.dispatch(&record).await;

        assert_eq!(entry.outcome, LedgerOutcome::Error);
        assert!(entry.detail.contains("X-Message-Id"));
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
