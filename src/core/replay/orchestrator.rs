//! Replay loop
//!
//! Walks the retrieved records in order. For each one: honour Stopped and
//! Paused, build the replay record, dispatch it, apply the single-step rule,
//! then wait out the inter-batch delay if a batch just closed.

use super::controller::{ReplayController, ReplayMode};
use super::dispatcher::Dispatcher;
use super::summary::{LedgerEntry, LedgerOutcome, RunResult};
use crate::core::transform::{build_replay_record, ReplayOptions};
use crate::domain::Record;
use crate::logging::Transcript;
use std::time::Instant;

const PAUSE_HINT: &str = "Paused. Enter R to resume, S to step one record, X to stop.";

/// Drives one replay run over an already-retrieved record set
pub struct RunOrchestrator {
    dispatcher: Dispatcher,
    options: ReplayOptions,
}

impl RunOrchestrator {
    pub fn new(dispatcher: Dispatcher, options: ReplayOptions) -> Self {
        Self {
            dispatcher,
            options,
        }
    }

    /// Replays `records` and returns the ledgers
    ///
    /// Never fails: per-record problems land in the error ledger, and an
    /// operator stop ends the loop with [`RunResult::stopped`] set.
    pub async fn run(
        &self,
        records: &[Record],
        controller: &mut ReplayController,
        transcript: &mut Transcript,
    ) -> RunResult {
        let started = Instant::now();
        let mut result = RunResult::new(records.len());
        controller.begin(records.len());

        crate::log_replay_start!(
            self.dispatcher.action(),
            self.dispatcher.endpoint(),
            records.len()
        );

        for (index, record) in records.iter().enumerate() {
            if controller.poll() == ReplayMode::Stopped {
                result.stopped = true;
                break;
            }

            if controller.mode() == ReplayMode::Paused {
                transcript.line(PAUSE_HINT);
                if controller.wait_while_paused().await == ReplayMode::Stopped {
                    result.stopped = true;
                    break;
                }
            }

            let entry = match build_replay_record(record, &self.options) {
                Ok(replay) => self.dispatcher.dispatch(&replay).await,
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "Record could not be prepared");
                    LedgerEntry::new(LedgerOutcome::Error, record.id.clone(), e.to_string())
                }
            };
            transcript.line(format!("[{}/{}] {entry}", index + 1, records.len()));
            result.record(entry);

            controller.record_completed(index);

            if controller.is_batch_boundary(index) && controller.mode() == ReplayMode::Running {
                crate::log_batch_complete!(index + 1, records.len());
                transcript.line(format!(
                    "Batch complete: {}/{} record(s), waiting {} ms",
                    index + 1,
                    records.len(),
                    controller.state().batch_delay.as_millis()
                ));
                controller.wait_batch_delay().await;
            }
        }

        let result = result.with_duration(started.elapsed());
        result.log_summary();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::target::{ReplayRequest, ReplayTarget, TargetResponse};
    use crate::config::HeaderNames;
    use crate::core::replay::controller::ReplayState;
    use crate::core::replay::dispatcher::DispatchAction;
    use crate::core::replay::signal::{ChannelSignal, ControlCommand, NoSignal};
    use crate::core::transform::ProvenanceOverrides;
    use crate::domain::{DispatchError, RecordId};
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedSender;

    /// Records sent ids; optionally pushes a command after the n-th send
    struct ScriptedTarget {
        sent: Mutex<Vec<String>>,
        after: Option<(usize, ControlCommand, UnboundedSender<ControlCommand>)>,
        fail_ids: Vec<String>,
    }

    impl ScriptedTarget {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                after: None,
                fail_ids: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ReplayTarget for ScriptedTarget {
        async fn send(&self, request: &ReplayRequest) -> Result<TargetResponse, DispatchError> {
            let id = request.header("X-Message-Id").unwrap_or_default().to_string();
            let count = {
                let mut sent = self.sent.lock().unwrap();
                sent.push(id.clone());
                sent.len()
            };
            if let Some((n, command, tx)) = &self.after {
                if count == *n {
                    tx.send(*command).unwrap();
                }
            }
            if self.fail_ids.contains(&id) {
                return Err(DispatchError::ConnectionFailed("refused".to_string()));
            }
            Ok(TargetResponse {
                status: 200,
                body: String::new(),
            })
        }

        fn endpoint(&self) -> &str {
            "stub://target"
        }
    }

    fn options() -> ReplayOptions {
        ReplayOptions {
            provenance: ProvenanceOverrides {
                target_label: "ie-test".to_string(),
                fallback_state: "Resent".to_string(),
                source_field: "Provenance".to_string(),
                ..ProvenanceOverrides::default()
            },
            payload_field: "Payload".to_string(),
            message_id_field: "MessageId".to_string(),
            clean_envelope: true,
            reset_message_id: false,
        }
    }

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let fields: Map<String, Value> = serde_json::from_value(json!({
                    "Payload": format!("<Envelope><Payload source=\"Input\">{i}</Payload></Envelope>"),
                    "MessageId": format!("m-{i}"),
                    "BK": {"Seq": i.to_string()}
                }))
                .unwrap();
                Record::new(RecordId::new(format!("r-{i}")).unwrap(), fields)
            })
            .collect()
    }

    fn orchestrator(action: DispatchAction, target: Arc<ScriptedTarget>) -> RunOrchestrator {
        let dispatcher = Dispatcher::new(action, target, HeaderNames::default(), "resend");
        RunOrchestrator::new(dispatcher, options())
    }

    fn headless(total: usize, batch_size: usize, delay: Duration) -> ReplayController {
        ReplayController::new(
            ReplayState::new(total, batch_size, delay, false),
            Box::new(NoSignal),
            Duration::from_millis(5),
        )
    }

    #[tokio::test]
    async fn test_all_records_dispatched_in_order() {
        let target = Arc::new(ScriptedTarget::new());
        let records = records(5);

        let result = orchestrator(DispatchAction::Send, target.clone())
            .run(&records, &mut headless(5, 2, Duration::ZERO), &mut Transcript::quiet())
            .await;

        assert_eq!(result.successes.len(), 5);
        assert!(result.errors.is_empty());
        assert!(!result.stopped);
        assert_eq!(
            *target.sent.lock().unwrap(),
            vec!["m-0", "m-1", "m-2", "m-3", "m-4"]
        );
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_record() {
        let mut target = ScriptedTarget::new();
        target.fail_ids = vec!["m-1".to_string()];
        let target = Arc::new(target);

        let result = orchestrator(DispatchAction::Send, target.clone())
            .run(&records(3), &mut headless(3, 10, Duration::ZERO), &mut Transcript::quiet())
            .await;

        assert_eq!(result.successes.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].record_id.as_str(), "r-1");
        assert_eq!(target.sent.lock().unwrap().len(), 3);
        assert_eq!(result.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_unpreparable_record_is_error_entry() {
        let target = Arc::new(ScriptedTarget::new());
        let mut records = records(2);
        records[0].fields.remove("Payload");

        let result = orchestrator(DispatchAction::Send, target.clone())
            .run(&records, &mut headless(2, 10, Duration::ZERO), &mut Transcript::quiet())
            .await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.successes.len(), 1);
        assert_eq!(*target.sent.lock().unwrap(), vec!["m-1"]);
    }

    #[tokio::test]
    async fn test_stop_after_record_i() {
        let (tx, signal) = ChannelSignal::channel();
        let mut target = ScriptedTarget::new();
        target.after = Some((3, ControlCommand::Stop, tx));
        let target = Arc::new(target);

        let mut controller = ReplayController::new(
            ReplayState::new(10, 2, Duration::from_millis(10), false),
            Box::new(signal),
            Duration::from_millis(5),
        );

        let result = orchestrator(DispatchAction::Send, target.clone())
            .run(&records(10), &mut controller, &mut Transcript::quiet())
            .await;

        assert!(result.stopped);
        assert_eq!(result.processed(), 3);
        assert_eq!(target.sent.lock().unwrap().len(), 3);
        assert_eq!(result.exit_code(), 130);
    }

    #[tokio::test]
    async fn test_single_step_then_resume() {
        let (tx, signal) = ChannelSignal::channel();
        let mut target = ScriptedTarget::new();
        target.after = Some((1, ControlCommand::Resume, tx));
        let target = Arc::new(target);

        let mut controller = ReplayController::new(
            ReplayState::new(4, 10, Duration::ZERO, true),
            Box::new(signal),
            Duration::from_millis(5),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            orchestrator(DispatchAction::Send, target.clone()).run(
                &records(4),
                &mut controller,
                &mut Transcript::quiet(),
            ),
        )
        .await
        .unwrap();

        assert_eq!(result.successes.len(), 4);
        assert_eq!(controller.mode(), ReplayMode::Running);
    }

    #[tokio::test]
    async fn test_no_delay_after_last_record() {
        let target = Arc::new(ScriptedTarget::new());
        let started = std::time::Instant::now();

        let result = orchestrator(DispatchAction::Send, target)
            .run(
                &records(4),
                &mut headless(4, 2, Duration::from_millis(300)),
                &mut Transcript::quiet(),
            )
            .await;

        assert_eq!(result.successes.len(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "one mid-run delay expected");
        assert!(elapsed < Duration::from_millis(600), "no delay after the last record");
    }

    #[tokio::test]
    async fn test_record_count_overrides_controller_total() {
        let target = Arc::new(ScriptedTarget::new());
        let mut controller = headless(10, 2, Duration::from_millis(300));
        let started = std::time::Instant::now();

        let result = orchestrator(DispatchAction::Send, target)
            .run(&records(4), &mut controller, &mut Transcript::quiet())
            .await;

        assert_eq!(result.successes.len(), 4);
        assert_eq!(controller.state().total, 4);
        assert_eq!(controller.state().index, 4);
        assert!(started.elapsed() < Duration::from_millis(600), "no delay after the last record");
    }

    #[tokio::test]
    async fn test_test_and_send_parity() {
        let records = records(3);

        let sent = orchestrator(DispatchAction::Send, Arc::new(ScriptedTarget::new()))
            .run(&records, &mut headless(3, 10, Duration::ZERO), &mut Transcript::quiet())
            .await;
        let tested = orchestrator(DispatchAction::Test, Arc::new(ScriptedTarget::new()))
            .run(&records, &mut headless(3, 10, Duration::ZERO), &mut Transcript::quiet())
            .await;

        assert_eq!(sent.successes.len(), tested.successes.len());
        let ids = |r: &RunResult| -> Vec<String> {
            r.successes.iter().map(|e| e.record_id.to_string()).collect()
        };
        assert_eq!(ids(&sent), ids(&tested));
        assert!(sent.successes.iter().all(|e| e.outcome == LedgerOutcome::Ok));
        assert!(tested.successes.iter().all(|e| e.outcome == LedgerOutcome::TestOk));
    }
}
