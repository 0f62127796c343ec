//! Controlled replay
//!
//! - [`signal`] - operator commands and their feeders
//! - [`controller`] - Running / Paused / SingleStep / Stopped state machine
//! - [`dispatcher`] - one record in, one ledger entry out
//! - [`orchestrator`] - the sequential replay loop
//! - [`summary`] - ledgers, final report and exit codes

pub mod controller;
pub mod dispatcher;
pub mod orchestrator;
pub mod signal;
pub mod summary;

pub use controller::{ReplayController, ReplayMode, ReplayState};
pub use dispatcher::{DispatchAction, Dispatcher};
pub use orchestrator::RunOrchestrator;
pub use signal::{ChannelSignal, ControlCommand, ControlSignal, Interrupt, NoSignal};
pub use summary::{LedgerEntry, LedgerOutcome, RunResult};
