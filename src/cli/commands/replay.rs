//! Replay command implementation
//!
//! This module implements the `replay` command: validate arguments, exhaust
//! the search, then report (`query`), dry-run (`test`) or send (`send`).

use crate::adapters::search::{ScrollSearchClient, SearchRequest};
use crate::adapters::target::HttpReplayTarget;
use crate::config::{load_config, ResendConfig};
use crate::core::query::{build_query, parse_filters, GroupReport, RecordFilter, TimeRange};
use crate::core::replay::signal::spawn_keyboard_listener;
use crate::core::replay::summary::EXIT_STOPPED;
use crate::core::replay::{
    ChannelSignal, ControlCommand, DispatchAction, Dispatcher, Interrupt, ReplayController,
    ReplayState, RunOrchestrator,
};
use crate::core::transform::{ProvenanceOverrides, ReplayOptions};
use crate::domain::{ResendError, Result, TargetName};
use crate::logging::Transcript;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// What to do with the retrieved records
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Report per-group counts and time spans; nothing is dispatched
    Query,
    /// Build every request without sending it
    Test,
    /// Send every record to the target
    Send,
}

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Start of the time range (RFC 3339 or local `YYYY-MM-DD[ HH:MM:SS]`)
    #[arg(long)]
    pub from: String,

    /// End of the time range
    #[arg(long)]
    pub to: String,

    /// Record filter, repeatable; at least one is required
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Action to perform
    #[arg(long, value_enum, default_value_t = Action::Query)]
    pub action: Action,

    /// Replay target name from the [targets] table (required for test/send)
    #[arg(long)]
    pub target: Option<String>,

    /// Override records per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override inter-batch delay in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Filter party added to the provenance header
    #[arg(long)]
    pub party: Option<String>,

    /// Filter subscription id added to the provenance header
    #[arg(long)]
    pub subscription_id: Option<String>,

    /// Override the process state used when a record has no provenance
    #[arg(long)]
    pub fallback_state: Option<String>,

    /// Remove non-input payload sections from enveloped payloads
    #[arg(long)]
    pub clean_envelope: bool,

    /// Send an empty message id so the target assigns new ones
    #[arg(long)]
    pub new_ids: bool,

    /// Start paused in single-step mode
    #[arg(long)]
    pub step: bool,

    /// Append every output line to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Resolved replay target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub name: TargetName,
    pub url: String,
}

/// Everything checked before the first network call
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub range: TimeRange,
    pub filters: Vec<RecordFilter>,
    pub action: Action,
    pub target: Option<ResolvedTarget>,
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl ReplayArgs {
    /// Validates arguments against the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ResendError::Validation`] for a missing filter, a bad time
    /// range, a zero batch size, or a missing or unknown target when the
    /// action dispatches.
    pub fn plan(&self, config: &ResendConfig) -> Result<RunPlan> {
        let filters = parse_filters(&self.filters)?;
        let range = TimeRange::parse(&self.from, &self.to)?;

        let batch_size = self.batch_size.unwrap_or(config.replay.batch_size);
        if batch_size == 0 {
            return Err(ResendError::Validation("batch size must be > 0".to_string()));
        }

        let target = match self.action {
            Action::Query => None,
            Action::Test | Action::Send => {
                let raw = self.target.as_deref().ok_or_else(|| {
                    ResendError::Validation(format!(
                        "--target is required for --action {}",
                        self.action_name()
                    ))
                })?;
                let name = TargetName::new(raw).map_err(ResendError::Validation)?;
                let url = config.target_url(name.as_str()).ok_or_else(|| {
                    ResendError::Validation(format!(
                        "unknown target '{name}'; known targets: {}",
                        config.targets.keys().cloned().collect::<Vec<_>>().join(", ")
                    ))
                })?;
                Some(ResolvedTarget {
                    name,
                    url: url.to_string(),
                })
            }
        };

        Ok(RunPlan {
            range,
            filters,
            action: self.action,
            target,
            batch_size,
            batch_delay: Duration::from_millis(
                self.delay_ms.unwrap_or(config.replay.batch_delay_ms),
            ),
        })
    }

    /// Per-record transform settings for this run
    pub fn replay_options(&self, config: &ResendConfig, target: &ResolvedTarget) -> ReplayOptions {
        ReplayOptions {
            provenance: ProvenanceOverrides {
                target_label: target.name.to_string(),
                party: self.party.clone(),
                subscription_id: self.subscription_id.clone(),
                fallback_state: self
                    .fallback_state
                    .clone()
                    .unwrap_or_else(|| config.replay.fallback_state.clone()),
                source_field: config.replay.provenance_field.clone(),
            },
            payload_field: config.replay.payload_field.clone(),
            message_id_field: config.replay.message_id_field.clone(),
            clean_envelope: self.clean_envelope,
            reset_message_id: self.new_ids,
        }
    }

    fn action_name(&self) -> &'static str {
        match self.action {
            Action::Query => "query",
            Action::Test => "test",
            Action::Send => "send",
        }
    }

    /// Execute the replay command
    ///
    /// `control_tx` feeds `control`; the keyboard listener is attached to it
    /// once dispatch begins. Before that, `interrupt` cancels retrieval and
    /// the confirmation prompt.
    pub async fn execute(
        &self,
        config_path: &str,
        control_tx: UnboundedSender<ControlCommand>,
        control: ChannelSignal,
        mut interrupt: Interrupt,
    ) -> anyhow::Result<i32> {
        tracing::info!(action = self.action_name(), "Starting replay command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration loading failed");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let plan = match self.plan(&config) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(error = %e, "Replay arguments rejected");
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let mut transcript = Transcript::stdout();
        if let Some(path) = &self.log_file {
            transcript = match transcript.with_file(path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(2);
                }
            };
        }

        transcript.line(format!(
            "Searching {} from {} to {} where {}",
            config.search.url,
            plan.range.from.to_rfc3339(),
            plan.range.to.to_rfc3339(),
            plan.filters
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" and ")
        ));

        let client = ScrollSearchClient::new(&config.search)?;
        let request = SearchRequest::from_config(
            &config.search,
            build_query(&plan.range, &plan.filters, &config.search),
        );

        let fetched = interrupt
            .run_until(client.fetch_all(&request, |progress| {
                crate::log_page_fetched!(progress.page, progress.page_hits, progress.total_so_far);
                transcript.line(format!(
                    "Page {}: {} hit(s), {} total",
                    progress.page, progress.page_hits, progress.total_so_far
                ));
            }))
            .await;

        let records = match fetched {
            Some(Ok(records)) => records,
            None => {
                tracing::warn!("Retrieval interrupted by operator");
                transcript.line("Retrieval interrupted, nothing was replayed.");
                return Ok(EXIT_STOPPED);
            }
            Some(Err(e)) => {
                crate::log_error_with_context!(&e, "Retrieval failed");
                transcript.line(format!("Retrieval failed, nothing was replayed: {e}"));
                return Ok(4);
            }
        };

        if plan.action == Action::Query {
            let report = GroupReport::build(
                &records,
                &config.search.group_field,
                &config.search.timestamp_field,
            );
            transcript.lines(report.lines());
            return Ok(0);
        }

        if records.is_empty() {
            transcript.line("No records matched; nothing to replay.");
            return Ok(0);
        }

        let Some(target) = plan.target.as_ref() else {
            return Err(ResendError::Validation("no target resolved".to_string()).into());
        };

        if plan.action == Action::Send && !self.yes {
            match confirm(records.len(), target, &mut interrupt).await? {
                Some(true) => {}
                Some(false) => {
                    transcript.line("Replay cancelled.");
                    return Ok(0);
                }
                None => {
                    transcript.line("Interrupted before sending, nothing was replayed.");
                    return Ok(EXIT_STOPPED);
                }
            }
        }

        let action = match plan.action {
            Action::Send => DispatchAction::Send,
            _ => DispatchAction::Test,
        };
        let http_target = HttpReplayTarget::new(target.url.clone(), &config.replay)?;
        let dispatcher = Dispatcher::new(
            action,
            Arc::new(http_target),
            config.replay.headers.clone(),
            config.replay.source_host.clone(),
        );
        let orchestrator = RunOrchestrator::new(dispatcher, self.replay_options(&config, target));

        let mut controller = ReplayController::new(
            ReplayState::new(records.len(), plan.batch_size, plan.batch_delay, self.step),
            Box::new(control),
            Duration::from_millis(config.replay.pause_poll_ms),
        );

        let _keyboard = spawn_keyboard_listener(control_tx);
        transcript.line(format!(
            "Replaying {} record(s) to {} ({}), batch size {}, delay {} ms",
            records.len(),
            target.name,
            action,
            plan.batch_size,
            plan.batch_delay.as_millis()
        ));
        transcript.line("Controls: P pause, R resume, S single step, X stop (then Enter)");

        let result = orchestrator
            .run(&records, &mut controller, &mut transcript)
            .await;

        transcript.lines(result.report_lines());
        Ok(result.exit_code())
    }
}

/// Asks the operator before sending
///
/// Returns `None` if interrupted while waiting for an answer.
async fn confirm(
    count: usize,
    target: &ResolvedTarget,
    interrupt: &mut Interrupt,
) -> anyhow::Result<Option<bool>> {
    use std::io::{self, Write};

    println!();
    println!("About to send {count} record(s) to {} ({})", target.name, target.url);
    print!("Proceed? [y/N]: ");
    io::stdout().flush()?;

    let answer = tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        io::stdin().read_line(&mut input).map(|_| input)
    });

    match interrupt.run_until(answer).await {
        Some(joined) => {
            let input = joined??;
            Ok(Some(input.trim().eq_ignore_ascii_case("y")))
        }
        None => {
            println!();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::SAMPLE_CONFIG;
    use test_case::test_case;

    fn config() -> ResendConfig {
        toml::from_str(SAMPLE_CONFIG).unwrap()
    }

    fn args(action: Action, target: Option<&str>) -> ReplayArgs {
        ReplayArgs {
            from: "2024-03-01T00:00:00Z".to_string(),
            to: "2024-03-02T00:00:00Z".to_string(),
            filters: vec!["ScenarioName=ADT".to_string()],
            action,
            target: target.map(str::to_string),
            batch_size: None,
            delay_ms: None,
            party: None,
            subscription_id: None,
            fallback_state: None,
            clean_envelope: false,
            new_ids: false,
            step: false,
            log_file: None,
            yes: true,
        }
    }

    #[test]
    fn test_plan_query_needs_no_target() {
        let plan = args(Action::Query, None).plan(&config()).unwrap();
        assert!(plan.target.is_none());
        assert_eq!(plan.batch_size, 10);
        assert_eq!(plan.batch_delay, Duration::from_millis(1000));
    }

    #[test_case(Action::Test ; "test")]
    #[test_case(Action::Send ; "send")]
    fn test_plan_dispatch_requires_target(action: Action) {
        let err = args(action, None).plan(&config()).unwrap_err();
        assert!(err.to_string().contains("--target"));
    }

    #[test]
    fn test_plan_unknown_target() {
        let err = args(Action::Send, Some("nowhere")).plan(&config()).unwrap_err();
        assert!(matches!(err, ResendError::Validation(_)));
        assert!(err.to_string().contains("ie-test"));
    }

    #[test]
    fn test_plan_resolves_target_and_overrides() {
        let mut args = args(Action::Send, Some(" ie-test "));
        args.batch_size = Some(3);
        args.delay_ms = Some(0);

        let plan = args.plan(&config()).unwrap();
        let target = plan.target.unwrap();
        assert_eq!(target.name.as_str(), "ie-test");
        assert_eq!(target.url, "https://ie-test.example.org:8443/replay");
        assert_eq!(plan.batch_size, 3);
        assert_eq!(plan.batch_delay, Duration::ZERO);
    }

    #[test]
    fn test_plan_rejects_missing_filter() {
        let mut args = args(Action::Query, None);
        args.filters.clear();
        assert!(args.plan(&config()).is_err());
    }

    #[test]
    fn test_plan_rejects_inverted_range() {
        let mut args = args(Action::Query, None);
        std::mem::swap(&mut args.from, &mut args.to);
        assert!(args.plan(&config()).is_err());
    }

    #[test]
    fn test_plan_rejects_zero_batch_size() {
        let mut args = args(Action::Query, None);
        args.batch_size = Some(0);
        assert!(args.plan(&config()).is_err());
    }

    #[test]
    fn test_replay_options_from_args() {
        let mut args = args(Action::Test, Some("ie-test"));
        args.party = Some("WardSys".to_string());
        args.fallback_state = Some("Manual".to_string());
        args.clean_envelope = true;
        args.new_ids = true;

        let config = config();
        let plan = args.plan(&config).unwrap();
        let options = args.replay_options(&config, plan.target.as_ref().unwrap());

        assert_eq!(options.provenance.target_label, "ie-test");
        assert_eq!(options.provenance.party.as_deref(), Some("WardSys"));
        assert_eq!(options.provenance.fallback_state, "Manual");
        assert_eq!(options.payload_field, "Payload");
        assert!(options.clean_envelope);
        assert!(options.reset_message_id);
    }
}
