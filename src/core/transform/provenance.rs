//! Provenance header construction
//!
//! The provenance header describes where a replayed message originally came
//! from and which instance it is being replayed to. When the record carries
//! its own provenance document the origin fields are reused from it.

use super::encoding::{decode_header_token, encode_header_token};
use crate::domain::{Record, ResendError, Result};
use chrono::{DateTime, FixedOffset, Local};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Root element of a provenance document
pub const PROVENANCE_ROOT: &str = "Provenance";

/// Origin party used when the record has no provenance document
pub const UNKNOWN_PARTY: &str = "Unknown";

/// Caller-supplied settings for provenance headers, fixed for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceOverrides {
    /// Instance label of the replay target
    pub target_label: String,

    /// Optional filter party; omitted from the document when empty
    pub party: Option<String>,

    /// Optional filter subscription id; omitted from the document when empty
    pub subscription_id: Option<String>,

    /// Process state used when the record carries no provenance document
    pub fallback_state: String,

    /// Record field holding the embedded provenance document
    pub source_field: String,
}

/// Origin fields of a provenance document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceFields {
    pub origin_party: String,
    pub receive_id: String,
    pub message_type: String,
    pub receiving_scenario: String,
    pub receiving_process: String,
    pub process_state: String,
}

impl ProvenanceFields {
    /// Defaults used when no embedded document is usable
    pub fn fallback(state: &str) -> Self {
        Self {
            origin_party: UNKNOWN_PARTY.to_string(),
            process_state: state.to_string(),
            ..Self::default()
        }
    }

    /// Parses a provenance document
    ///
    /// Returns `None` unless the text is well-formed XML rooted at
    /// `Provenance`.
    pub fn parse(xml: &str) -> Option<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut fields = Self::default();
        let mut depth = 0usize;
        let mut root_seen = false;
        let mut current: Option<String> = None;

        loop {
            match reader.read_event().ok()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if depth == 0 {
                        if root_seen || name != PROVENANCE_ROOT {
                            return None;
                        }
                        root_seen = true;
                    } else if depth == 1 {
                        current = Some(name);
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        let is_root = e.local_name().as_ref() == PROVENANCE_ROOT.as_bytes();
                        if root_seen || !is_root {
                            return None;
                        }
                        root_seen = true;
                    }
                }
                Event::Text(t) => {
                    if depth == 2 {
                        if let Some(name) = current.as_deref() {
                            let text = t.unescape().ok()?.into_owned();
                            fields.set(name, text);
                        }
                    } else if depth == 0 {
                        return None;
                    }
                }
                Event::End(_) => {
                    depth = depth.checked_sub(1)?;
                    if depth == 1 {
                        current = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if root_seen && depth == 0 {
            Some(fields)
        } else {
            None
        }
    }

    fn set(&mut self, name: &str, value: String) {
        match name {
            "OriginParty" => self.origin_party = value,
            "ReceiveId" => self.receive_id = value,
            "MessageType" => self.message_type = value,
            "ReceivingScenario" => self.receiving_scenario = value,
            "ReceivingProcess" => self.receiving_process = value,
            "ProcessState" => self.process_state = value,
            _ => {}
        }
    }
}

/// Builds the encoded provenance header for `record`, stamped with the local clock
pub fn build_provenance_header(record: &Record, overrides: &ProvenanceOverrides) -> Result<String> {
    build_provenance_header_at(record, overrides, DateTime::<FixedOffset>::from(Local::now()))
}

/// Builds the encoded provenance header with an explicit receive timestamp
pub fn build_provenance_header_at(
    record: &Record,
    overrides: &ProvenanceOverrides,
    received_at: DateTime<FixedOffset>,
) -> Result<String> {
    let fields = embedded_provenance(record, &overrides.source_field)
        .unwrap_or_else(|| ProvenanceFields::fallback(&overrides.fallback_state));

    let xml = render_provenance(&fields, overrides, received_at)?;
    Ok(encode_header_token(&xml))
}

/// Reads the record's own provenance document, if it has a usable one
///
/// The field may hold the document as a header token (base64, optionally
/// percent-encoded) or as raw XML.
pub fn embedded_provenance(record: &Record, field: &str) -> Option<ProvenanceFields> {
    let raw = record.field_text(field)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let xml = if raw.starts_with('<') {
        raw.to_string()
    } else {
        decode_header_token(raw)?
    };

    ProvenanceFields::parse(&xml)
}

fn render_provenance(
    fields: &ProvenanceFields,
    overrides: &ProvenanceOverrides,
    received_at: DateTime<FixedOffset>,
) -> Result<String> {
    let timestamp = received_at.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string();

    let mut elements: Vec<(&str, &str)> = vec![
        ("OriginParty", fields.origin_party.as_str()),
        ("ReceiveId", fields.receive_id.as_str()),
        ("ReceiveTimestamp", timestamp.as_str()),
        ("MessageType", fields.message_type.as_str()),
        ("ReceivingScenario", fields.receiving_scenario.as_str()),
        ("ReceivingProcess", fields.receiving_process.as_str()),
        ("ProcessState", fields.process_state.as_str()),
    ];

    if !overrides.target_label.trim().is_empty() {
        elements.push(("Instance", overrides.target_label.trim()));
    }
    if let Some(party) = overrides.party.as_deref().filter(|p| !p.trim().is_empty()) {
        elements.push(("FilterParty", party));
    }
    if let Some(id) = overrides
        .subscription_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        elements.push(("FilterSubscriptionId", id));
    }

    let mut writer = Writer::new(Vec::new());
    write_xml(&mut writer, Event::Start(BytesStart::new(PROVENANCE_ROOT)))?;
    for (name, value) in elements {
        write_xml(&mut writer, Event::Start(BytesStart::new(name)))?;
        if !value.is_empty() {
            write_xml(&mut writer, Event::Text(BytesText::new(value)))?;
        }
        write_xml(&mut writer, Event::End(BytesEnd::new(name)))?;
    }
    write_xml(&mut writer, Event::End(BytesEnd::new(PROVENANCE_ROOT)))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| ResendError::Transform(format!("provenance document is not UTF-8: {e}")))
}

fn write_xml(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ResendError::Transform(format!("failed to write provenance document: {e}")))
}
