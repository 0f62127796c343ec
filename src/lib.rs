// resend - Integration Platform Message Replay Tool
// Copyright (c) 2025 resend Contributors
// Licensed under the MIT License

//! # resend - paginated retrieval and controlled replay
//!
//! resend pulls messages out of the integration platform's search index and
//! replays them to an HTTP target, one record at a time, under operator
//! control.
//!
//! ## Overview
//!
//! - **Retrieving** every hit of a time-bounded, filtered query through a
//!   scroll cursor; any failed page aborts the whole retrieval
//! - **Transforming** each record into a replay request with provenance and
//!   business-key headers and an optionally cleaned envelope
//! - **Replaying** in batches with pause, resume, single-step and stop, and
//!   per-record failure isolation
//! - **Reporting** a success ledger and an error ledger at the end of the run
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Query construction, transformation, the replay loop
//! - [`adapters`] - Search backend client and replay targets
//! - [`domain`] - Records, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and the operator transcript
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resend::adapters::search::{ScrollSearchClient, SearchRequest};
//! use resend::config::load_config;
//! use resend::core::query::{build_query, parse_filters, TimeRange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("resend.toml")?;
//! let range = TimeRange::parse("2024-03-01", "2024-03-02")?;
//! let filters = parse_filters(&["ScenarioName=ADT_A01".to_string()])?;
//!
//! let client = ScrollSearchClient::new(&config.search)?;
//! let request = SearchRequest::from_config(
//!     &config.search,
//!     build_query(&range, &filters, &config.search),
//! );
//! let records = client.fetch_all(&request, |_| {}).await?;
//!
//! println!("Retrieved {} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::ResendError`]. Retrieval errors are fatal to
//! a run; dispatch errors end up in the error ledger and the loop continues.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
