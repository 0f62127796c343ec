//! Record transformation
//!
//! Turns a retrieved [`Record`] into the send-ready [`ReplayRecord`]:
//!
//! - [`provenance`] - provenance header (where the message came from, where it is going)
//! - [`business_key`] - deterministic business-key header
//! - [`envelope`] - removal of non-input payload sections
//! - [`encoding`] - the base64 + percent-encoding shared by both headers

pub mod business_key;
pub mod encoding;
pub mod envelope;
pub mod provenance;

pub use business_key::build_business_key_header;
pub use envelope::clean_envelope;
pub use provenance::{build_provenance_header, ProvenanceOverrides};

use crate::domain::{Record, ReplayRecord, ResendError, Result};

/// Per-run settings for building replay records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Settings for the provenance header
    pub provenance: ProvenanceOverrides,

    /// Record field holding the payload text
    pub payload_field: String,

    /// Record field holding the original message identifier
    pub message_id_field: String,

    /// Strip non-input sections from enveloped payloads
    pub clean_envelope: bool,

    /// Send an empty message identifier so the target assigns a new one
    pub reset_message_id: bool,
}

/// Builds the replay view of one record
///
/// # Errors
///
/// Returns [`ResendError::Transform`] when the record has no payload, or when
/// the provenance document cannot be written.
pub fn build_replay_record(record: &Record, options: &ReplayOptions) -> Result<ReplayRecord> {
    let payload = record
        .field_text(&options.payload_field)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ResendError::Transform(format!(
                "record {} has no '{}' field",
                record.id, options.payload_field
            ))
        })?;

    let payload = if options.clean_envelope {
        clean_envelope(&payload)
    } else {
        payload
    };

    let message_id = if options.reset_message_id {
        String::new()
    } else {
        record
            .field_text(&options.message_id_field)
            .unwrap_or_default()
    };

    Ok(ReplayRecord {
        id: record.id.clone(),
        payload,
        provenance_header: build_provenance_header(record, &options.provenance)?,
        business_key_header: build_business_key_header(record),
        message_id,
    })
}
