//! Operator control signals
//!
//! The replay loop never reads the console. Feeders (keyboard, interrupt
//! handler, tests) push [`ControlCommand`]s into a channel and the loop polls
//! it through [`ControlSignal`] without blocking.

use std::future::Future;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// `P`
    Pause,
    /// `R`
    Resume,
    /// `S`
    Step,
    /// `X`, Ctrl+C or SIGTERM
    Stop,
}

impl ControlCommand {
    /// Maps an operator key (case-insensitive) to a command
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'P' => Some(Self::Pause),
            'R' => Some(Self::Resume),
            'S' => Some(Self::Step),
            'X' => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Non-blocking source of operator commands
pub trait ControlSignal: Send {
    /// Next pending command, if any
    fn try_next(&mut self) -> Option<ControlCommand>;
}

/// Signal fed through a tokio channel
pub struct ChannelSignal {
    rx: mpsc::UnboundedReceiver<ControlCommand>,
}

impl ChannelSignal {
    pub fn new(rx: mpsc::UnboundedReceiver<ControlCommand>) -> Self {
        Self { rx }
    }

    /// Creates a connected sender and signal
    pub fn channel() -> (mpsc::UnboundedSender<ControlCommand>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }
}

impl ControlSignal for ChannelSignal {
    fn try_next(&mut self) -> Option<ControlCommand> {
        self.rx.try_recv().ok()
    }
}

/// Headless runs: never yields a command
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignal;

impl ControlSignal for NoSignal {
    fn try_next(&mut self) -> Option<ControlCommand> {
        None
    }
}

/// Process interrupt flag, raised once by the interrupt listener
///
/// The replay loop sees interrupts as [`ControlCommand::Stop`]; work that runs
/// before the loop (retrieval, the confirmation prompt) races against this
/// flag instead.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Creates the raising side and the flag
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised
    ///
    /// Never resolves if the raising side is dropped without raising.
    pub async fn raised(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drives `work` to completion unless the flag is raised first
    ///
    /// Returns `None` when interrupted; `work` is dropped at that point.
    pub async fn run_until<F: Future>(&mut self, work: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.raised() => None,
            output = work => Some(output),
        }
    }
}

/// Reads operator keys from stdin, one command per line
///
/// Only the first character of each line counts. The task ends at EOF or
/// once the receiving side is gone.
pub fn spawn_keyboard_listener(tx: mpsc::UnboundedSender<ControlCommand>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(key) = line.trim().chars().next() else {
                        continue;
                    };
                    match ControlCommand::from_key(key) {
                        Some(command) => {
                            tracing::debug!(?command, "Operator command received");
                            if tx.send(command).is_err() {
                                break;
                            }
                        }
                        None => tracing::debug!(key = %key, "Ignoring unknown operator key"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Keyboard listener stopped");
                    break;
                }
            }
        }
    })
}

/// Turns Ctrl+C (and SIGTERM on unix) into [`ControlCommand::Stop`] and
/// raises the [`Interrupt`] flag
pub fn spawn_interrupt_listener(
    tx: mpsc::UnboundedSender<ControlCommand>,
    interrupt: watch::Sender<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("Received SIGINT (Ctrl+C), stopping replay");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, stopping replay");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!("Received SIGINT (Ctrl+C), stopping replay");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received SIGINT (Ctrl+C), stopping replay");
        }

        let _ = interrupt.send(true);
        let _ = tx.send(ControlCommand::Stop);
    })
}
