//! Business-key header construction
//!
//! The business-key header is a deterministic digest of a record's
//! domain-identifying fields. Downstream consumers compare it across replays
//! to detect duplicates, so it must never depend on the clock or on chance.

use super::encoding::encode_header_token;
use crate::domain::Record;

/// Control fields that live in the business-key section but are not business data
pub const EXCLUDED_BUSINESS_KEYS: [&str; 9] = [
    "Stage",
    "ReceivingParty",
    "Name",
    "History",
    "SubscriptionId",
    "SubscriptionIdList",
    "TargetId",
    "Workflow",
    "SendDate",
];

/// Escape sequences the source data may already carry, and their replacements
const RESERVED_ESCAPES: [(&str, &str); 4] = [("%3A", ":"), ("%3a", ":"), ("%7C", "|"), ("%7c", "|")];

/// Whether a business-key name is a control field
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_BUSINESS_KEYS
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(name))
}

/// Plain `name:value|name:value` text of the record's business keys
pub fn business_key_text(record: &Record) -> String {
    let joined = record
        .business_keys
        .iter()
        .filter(|(name, _)| !is_excluded(name))
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("|");

    RESERVED_ESCAPES
        .iter()
        .fold(joined, |text, (escaped, plain)| text.replace(escaped, plain))
}

/// Encoded business-key header for `record`
pub fn build_business_key_header(record: &Record) -> String {
    encode_header_token(&business_key_text(record))
}
