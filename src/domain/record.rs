//! Retrieved record and replay record models
//!
//! A [`Record`] is one search hit as it came off the backend. Its business-key
//! section is pulled out once at ingestion into an ordered [`BusinessKeys`]
//! mapping so later stages never enumerate loosely-typed fields.

use super::ids::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the nested business-key object, and prefix of flattened keys
pub const BUSINESS_KEY_PREFIX: &str = "BK";

/// Ordered `name -> value` mapping of a record's business keys
///
/// Order is the order fields appeared in the source document, which keeps
/// every derived header deterministic for a given record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessKeys(Vec<(String, String)>);

impl BusinessKeys {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, replacing the value in place if the name already exists
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Looks up a business key by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates keys in ingestion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of business keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record carried no business keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the mapping from a document source
    ///
    /// Accepts both a nested `BK` object and flattened `BK.<name>` fields; when
    /// both are present the nested object comes first.
    pub fn from_source(source: &Map<String, Value>) -> Self {
        let mut keys = Self::new();

        if let Some(Value::Object(nested)) = source.get(BUSINESS_KEY_PREFIX) {
            for (name, value) in nested {
                keys.insert(name.clone(), value_to_text(value));
            }
        }

        let dotted = format!("{BUSINESS_KEY_PREFIX}.");
        for (name, value) in source {
            if let Some(stripped) = name.strip_prefix(&dotted) {
                if !stripped.is_empty() {
                    keys.insert(stripped, value_to_text(value));
                }
            }
        }

        keys
    }
}

/// One document retrieved from the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Document identifier
    pub id: RecordId,

    /// Document source fields, in backend order
    pub fields: Map<String, Value>,

    /// Business keys extracted at ingestion
    pub business_keys: BusinessKeys,
}

impl Record {
    /// Creates a record from an identifier and its source fields
    pub fn new(id: RecordId, fields: Map<String, Value>) -> Self {
        let business_keys = BusinessKeys::from_source(&fields);
        Self {
            id,
            fields,
            business_keys,
        }
    }

    /// Converts one search hit (`{"_id": ..., "_source": {...}}`) into a record
    pub fn from_hit(hit: &Value) -> Result<Self, String> {
        let id = hit
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| "search hit is missing _id".to_string())?;
        let id = RecordId::new(id)?;

        let fields = match hit.get("_source") {
            Some(Value::Object(source)) => source.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                return Err(format!(
                    "search hit {id} has a non-object _source: {other}"
                ))
            }
        };

        Ok(Self::new(id, fields))
    }

    /// Returns a field as text
    ///
    /// Looks for an exact top-level key first, then walks a dotted path through
    /// nested objects. Non-string scalars are rendered as JSON text.
    pub fn field_text(&self, name: &str) -> Option<String> {
        if let Some(value) = self.fields.get(name) {
            return non_null_text(value);
        }

        let mut parts = name.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        non_null_text(current)
    }
}

/// Derived, send-ready view of a [`Record`]
///
/// Built once per record and consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    /// Identifier of the source record
    pub id: RecordId,

    /// Payload text to send, after optional envelope cleanup
    pub payload: String,

    /// Encoded provenance header value
    pub provenance_header: String,

    /// Encoded business-key header value
    pub business_key_header: String,

    /// Message identifier carried on the replay (empty when reset)
    pub message_id: String,
}

fn non_null_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(value_to_text(other)),
    }
}

/// Renders a JSON value as plain text
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
