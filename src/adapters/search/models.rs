//! Search backend wire models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a scroll search response
#[derive(Debug, Deserialize)]
pub struct ScrollPage {
    /// Cursor for the next page
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,

    /// Hits envelope; a page without one is malformed
    pub hits: HitsEnvelope,
}

/// `hits` section of a search response
#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    /// Total reported by the backend, either a number or `{ "value": n }`
    #[serde(default)]
    pub total: Option<Value>,

    /// Documents on this page
    pub hits: Vec<Value>,
}

impl HitsEnvelope {
    /// Exact total hit count reported by the backend, if any
    ///
    /// A `{ "value": n }` total only counts when its `relation` is `eq`
    /// (or absent); a lower bound (`gte`) is not a total.
    pub fn reported_total(&self) -> Option<usize> {
        match self.total.as_ref()? {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::Object(obj) => {
                let exact = obj
                    .get("relation")
                    .map_or(true, |relation| relation.as_str() == Some("eq"));
                if !exact {
                    return None;
                }
                obj.get("value")?.as_u64().map(|n| n as usize)
            }
            _ => None,
        }
    }
}

/// Continuation request body for `/_search/scroll`
#[derive(Debug, Serialize)]
pub struct ScrollContinuation<'a> {
    pub scroll: &'a str,
    pub scroll_id: &'a str,
}

/// Body for releasing a cursor
#[derive(Debug, Serialize)]
pub struct ClearScroll<'a> {
    pub scroll_id: &'a str,
}

/// Extracts a human-readable reason from a structured backend error body
///
/// Returns `None` when the body carries no `error` member.
pub fn error_reason(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if let Some(reason) = error.get("reason").and_then(Value::as_str) {
        return Some(reason.to_string());
    }
    if let Some(reason) = error
        .get("root_cause")
        .and_then(Value::as_array)
        .and_then(|causes| causes.first())
        .and_then(|cause| cause.get("reason"))
        .and_then(Value::as_str)
    {
        return Some(reason.to_string());
    }
    match error {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
