//! Envelope cleanup
//!
//! A stored payload is an `Envelope` holding one `Payload` section per
//! processing stage. Only the section that came from the input stage is
//! replayed; the others are cut out byte-for-byte so retained content keeps
//! its original formatting.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

/// Root element of a payload envelope
pub const ENVELOPE_ELEMENT: &str = "Envelope";

/// Direct child element holding one stage's payload
pub const SECTION_ELEMENT: &str = "Payload";

/// Attribute naming the stage a section came from
pub const SOURCE_ATTRIBUTE: &str = "source";

/// Stage whose sections are kept
pub const RETAINED_SOURCE: &str = "Input";

/// Removes every non-input payload section from an envelope
///
/// Input that is not a well-formed `Envelope` document is returned unchanged.
pub fn clean_envelope(payload: &str) -> String {
    match removable_sections(payload) {
        Some(ranges) if !ranges.is_empty() => {
            let mut cleaned = String::with_capacity(payload.len());
            let mut cursor = 0;
            for range in ranges {
                cleaned.push_str(&payload[cursor..range.start]);
                cursor = range.end;
            }
            cleaned.push_str(&payload[cursor..]);
            cleaned
        }
        _ => payload.to_string(),
    }
}

/// Byte ranges of the sections to drop, or `None` if the payload is not an envelope
fn removable_sections(payload: &str) -> Option<Vec<Range<usize>>> {
    let mut reader = Reader::from_str(payload);
    reader.trim_text(false);

    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut open_removal: Option<usize> = None;

    loop {
        let event = reader.read_event().ok()?;
        let end = reader.buffer_position();

        match event {
            Event::Start(e) => {
                if depth == 0 {
                    if root_seen || !is_envelope(&e) {
                        return None;
                    }
                    root_seen = true;
                } else if depth == 1 && is_dropped_section(&e)? {
                    open_removal = Some(tag_start(payload, end)?);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if root_seen || !is_envelope(&e) {
                        return None;
                    }
                    root_seen = true;
                } else if depth == 1 && is_dropped_section(&e)? {
                    ranges.push(tag_start(payload, end)?..end);
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1)?;
                if depth == 1 {
                    if let Some(start) = open_removal.take() {
                        ranges.push(start..end);
                    }
                }
            }
            Event::Text(t) => {
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Event::CData(_) => {
                if depth == 0 {
                    return None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if root_seen && depth == 0 {
        Some(ranges)
    } else {
        None
    }
}

fn is_envelope(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == ENVELOPE_ELEMENT.as_bytes()
}

/// `Some(true)` for a payload section from any stage other than input
fn is_dropped_section(e: &BytesStart<'_>) -> Option<bool> {
    if e.local_name().as_ref() != SECTION_ELEMENT.as_bytes() {
        return Some(false);
    }
    let source = match e.try_get_attribute(SOURCE_ATTRIBUTE).ok()? {
        Some(attr) => attr.unescape_value().ok()?.into_owned(),
        None => String::new(),
    };
    Some(source != RETAINED_SOURCE)
}

/// Start offset of the tag that ends just before `end`
fn tag_start(payload: &str, end: usize) -> Option<usize> {
    payload.get(..end)?.rfind('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_only_input_section() {
        let payload = r#"<Envelope><Payload source="Input"><MSH>a|b</MSH></Payload><Payload source="Map"><Mapped/></Payload><Payload source="Output">out</Payload></Envelope>"#;

        let cleaned = clean_envelope(payload);

        assert_eq!(
            cleaned,
            r#"<Envelope><Payload source="Input"><MSH>a|b</MSH></Payload></Envelope>"#
        );
        assert_eq!(cleaned.matches("<Payload").count(), 1);
    }

    #[test]
    fn test_retained_formatting_untouched() {
        let payload = "<?xml version=\"1.0\"?>\n<Envelope>\n  <Payload source='Input'>\n    <A  x=\"1\" />\n  </Payload>\n  <Payload source=\"Output\"><B/></Payload>\n</Envelope>\n";

        let cleaned = clean_envelope(payload);

        assert_eq!(
            cleaned,
            "<?xml version=\"1.0\"?>\n<Envelope>\n  <Payload source='Input'>\n    <A  x=\"1\" />\n  </Payload>\n  \n</Envelope>\n"
        );
    }

    #[test]
    fn test_self_closing_and_unmarked_sections_removed() {
        let payload = r#"<Envelope><Payload source="Map"/><Payload>no marker</Payload><Payload source="Input">in</Payload></Envelope>"#;
        assert_eq!(
            clean_envelope(payload),
            r#"<Envelope><Payload source="Input">in</Payload></Envelope>"#
        );
    }

    #[test]
    fn test_nested_sections_not_touched() {
        let payload = r#"<Envelope><Payload source="Input"><Payload source="Output">inner</Payload></Payload></Envelope>"#;
        assert_eq!(clean_envelope(payload), payload);
    }

    #[test]
    fn test_non_xml_returned_unchanged() {
        let payload = "MSH|^~\\&|LAB|HOSP|||20240305||ORU^R01|1|P|2.5";
        assert_eq!(clean_envelope(payload), payload);
    }

    #[test]
    fn test_other_root_returned_unchanged() {
        let payload = r#"<Message><Payload source="Map"/></Message>"#;
        assert_eq!(clean_envelope(payload), payload);
    }

    #[test]
    fn test_malformed_envelope_returned_unchanged() {
        let payload = r#"<Envelope><Payload source="Map"></Envelope>"#;
        assert_eq!(clean_envelope(payload), payload);

        let truncated = r#"<Envelope><Payload source="Map">x</Payload>"#;
        assert_eq!(clean_envelope(truncated), truncated);
    }

    #[test]
    fn test_empty_payload_unchanged() {
        assert_eq!(clean_envelope(""), "");
    }
}
