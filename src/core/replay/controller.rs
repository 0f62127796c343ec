//! Replay state machine
//!
//! Modes move only through operator commands or the automatic
//! SingleStep -> Paused transition after a record completes. `Stopped` is
//! terminal: once reached no further command is evaluated.

use super::signal::{ControlCommand, ControlSignal};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Execution mode of the replay loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    Running,
    Paused,
    SingleStep,
    Stopped,
}

impl fmt::Display for ReplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::SingleStep => "single-step",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Loop position and pacing, owned by one controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayState {
    pub mode: ReplayMode,

    /// Records completed so far
    pub index: usize,

    pub total: usize,
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl ReplayState {
    /// Initial state; `single_step` starts the run in [`ReplayMode::SingleStep`]
    pub fn new(total: usize, batch_size: usize, batch_delay: Duration, single_step: bool) -> Self {
        Self {
            mode: if single_step {
                ReplayMode::SingleStep
            } else {
                ReplayMode::Running
            },
            index: 0,
            total,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }
}

/// Owns the [`ReplayState`] and applies operator commands to it
pub struct ReplayController {
    state: ReplayState,
    signal: Box<dyn ControlSignal>,
    poll_interval: Duration,
}

impl ReplayController {
    pub fn new(state: ReplayState, signal: Box<dyn ControlSignal>, poll_interval: Duration) -> Self {
        Self {
            state,
            signal,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn mode(&self) -> ReplayMode {
        self.state.mode
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    /// Applies one command; returns the resulting mode
    pub fn apply(&mut self, command: ControlCommand) -> ReplayMode {
        let previous = self.state.mode;
        if previous == ReplayMode::Stopped {
            return previous;
        }

        self.state.mode = match command {
            ControlCommand::Pause => ReplayMode::Paused,
            ControlCommand::Resume => ReplayMode::Running,
            ControlCommand::Step => ReplayMode::SingleStep,
            ControlCommand::Stop => ReplayMode::Stopped,
        };

        if self.state.mode != previous {
            tracing::info!(from = %previous, to = %self.state.mode, "Replay mode changed");
        }
        self.state.mode
    }

    /// Drains pending commands without blocking
    pub fn poll(&mut self) -> ReplayMode {
        while self.state.mode != ReplayMode::Stopped {
            match self.signal.try_next() {
                Some(command) => {
                    self.apply(command);
                }
                None => break,
            }
        }
        self.state.mode
    }

    /// Blocks while paused, polling on a bounded sleep
    ///
    /// Returns the first non-paused mode.
    pub async fn wait_while_paused(&mut self) -> ReplayMode {
        while self.poll() == ReplayMode::Paused {
            tokio::time::sleep(self.poll_interval).await;
        }
        self.state.mode
    }

    /// Starts a pass over `total` records, resetting the position
    pub fn begin(&mut self, total: usize) {
        self.state.total = total;
        self.state.index = 0;
    }

    /// Marks record `index` (0-based) as completed
    ///
    /// A single step ends here: the controller drops back to Paused.
    pub fn record_completed(&mut self, index: usize) {
        self.state.index = index + 1;
        if self.state.mode == ReplayMode::SingleStep {
            self.state.mode = ReplayMode::Paused;
            tracing::debug!(index, "Single step complete, pausing");
        }
    }

    /// Whether record `index` closes a batch with more records to follow
    pub fn is_batch_boundary(&self, index: usize) -> bool {
        let completed = index + 1;
        completed % self.state.batch_size == 0 && completed < self.state.total
    }

    /// Waits out the inter-batch delay
    ///
    /// Any operator command ends the wait early: `R` resumes at once, `S`,
    /// `P` and `X` end it in their own mode.
    pub async fn wait_batch_delay(&mut self) -> ReplayMode {
        let deadline = Instant::now() + self.state.batch_delay;

        loop {
            if self.state.mode == ReplayMode::Stopped {
                break;
            }
            if let Some(command) = self.signal.try_next() {
                self.apply(command);
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }

        self.state.mode
    }
}
