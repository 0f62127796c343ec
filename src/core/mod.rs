//! Core replay logic
//!
//! # Modules
//!
//! - [`query`] - search body construction, pre-run validation, query-only report
//! - [`transform`] - replay headers and envelope cleanup
//! - [`replay`] - controller, dispatcher and the replay loop
//!
//! # Replay Workflow
//!
//! 1. **Validate**: time range, filters and target before any network I/O
//! 2. **Retrieve**: exhaust the scroll cursor; any failure aborts the run
//! 3. **Transform**: build headers and clean the envelope per record
//! 4. **Dispatch**: send (or test) one record at a time under operator control
//! 5. **Report**: print both ledgers and the final counts

pub mod query;
pub mod replay;
pub mod transform;
