//! Logging and operator output
//!
//! - [`structured`] - tracing subscriber setup (console plus optional JSON file)
//! - [`transcript`] - operator-facing lines with an optional append-only mirror
//!
//! # Example
//!
//! ```no_run
//! use resend::logging::init_logging;
//! use resend::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;
pub mod transcript;

pub use structured::{init_logging, LoggingGuard};
pub use transcript::Transcript;

/// Log the start of a replay run
///
/// # Example
///
/// ```no_run
/// use resend::log_replay_start;
///
/// log_replay_start!("send", "ie-test", 120);
/// ```
#[macro_export]
macro_rules! log_replay_start {
    ($action:expr, $target:expr, $records:expr) => {
        tracing::info!(
            action = %$action,
            target = %$target,
            records = $records,
            "Starting replay"
        );
    };
}

/// Log one retrieved search page
///
/// # Example
///
/// ```no_run
/// use resend::log_page_fetched;
///
/// log_page_fetched!(2, 1000, 2000);
/// ```
#[macro_export]
macro_rules! log_page_fetched {
    ($page:expr, $page_hits:expr, $total:expr) => {
        tracing::debug!(
            page = $page,
            page_hits = $page_hits,
            total_so_far = $total,
            "Fetched search page"
        );
    };
}

/// Log a completed batch
///
/// # Example
///
/// ```no_run
/// use resend::log_batch_complete;
///
/// log_batch_complete!(100, 1000);
/// ```
#[macro_export]
macro_rules! log_batch_complete {
    ($current:expr, $total:expr) => {
        tracing::info!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Batch complete"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use resend::log_error_with_context;
/// use resend::domain::ResendError;
///
/// let error = ResendError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
