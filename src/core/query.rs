//! Search query construction and the query-only report
//!
//! Pre-run validation lives here as well: a bad time range or a missing
//! filter is rejected before any request leaves the process.

use crate::config::{MatchMode, SearchConfig};
use crate::domain::{Record, ResendError, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Group label for records that lack the grouping field
pub const UNGROUPED: &str = "(none)";

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Inclusive time window of the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

impl TimeRange {
    /// Parses both bounds and checks `from` is before `to`
    ///
    /// Bounds may be RFC 3339, or `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` in
    /// local time.
    ///
    /// # Errors
    ///
    /// Returns [`ResendError::Validation`] for an unparseable or inverted range.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let range = Self {
            from: parse_timestamp(from)?,
            to: parse_timestamp(to)?,
        };
        range.validate()?;
        Ok(range)
    }

    /// Rejects empty or inverted ranges
    pub fn validate(&self) -> Result<()> {
        if self.from >= self.to {
            return Err(ResendError::Validation(format!(
                "time range start {} must be before end {}",
                self.from.to_rfc3339(),
                self.to.to_rfc3339()
            )));
        }
        Ok(())
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed);
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            ResendError::Validation(format!(
                "invalid timestamp '{text}': expected RFC 3339 or YYYY-MM-DD[ HH:MM:SS]"
            ))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(DateTime::<FixedOffset>::from)
        .ok_or_else(|| {
            ResendError::Validation(format!("timestamp '{text}' does not exist in local time"))
        })
}

/// One `FIELD=VALUE` record filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub field: String,
    pub value: String,
}

impl FromStr for RecordFilter {
    type Err = ResendError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, value) = s.split_once('=').ok_or_else(|| {
            ResendError::Validation(format!("filter '{s}' must have the form FIELD=VALUE"))
        })?;

        let field = field.trim();
        if field.is_empty() {
            return Err(ResendError::Validation(format!(
                "filter '{s}' has an empty field name"
            )));
        }

        Ok(Self {
            field: field.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl fmt::Display for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// Parses every filter argument, requiring at least one
pub fn parse_filters(raw: &[String]) -> Result<Vec<RecordFilter>> {
    if raw.is_empty() {
        return Err(ResendError::Validation(
            "at least one --filter FIELD=VALUE is required".to_string(),
        ));
    }
    raw.iter().map(|f| f.parse()).collect()
}

/// Builds the search body for a time window and filter set
pub fn build_query(range: &TimeRange, filters: &[RecordFilter], config: &SearchConfig) -> Value {
    let mut clauses = vec![json!({
        "range": {
            config.timestamp_field.as_str(): {
                "gte": range.from.to_rfc3339(),
                "lte": range.to.to_rfc3339(),
            }
        }
    })];

    clauses.extend(filters.iter().map(|filter| match config.match_mode {
        MatchMode::Exact => json!({
            "term": { format!("{}.keyword", filter.field): filter.value.as_str() }
        }),
        MatchMode::Analyzed => json!({
            "match_phrase": { filter.field.as_str(): filter.value.as_str() }
        }),
    }));

    json!({
        "size": config.page_size,
        "query": { "bool": { "filter": clauses } },
        "sort": [ { config.timestamp_field.as_str(): { "order": "asc" } } ],
    })
}

/// Count and time span of one record group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStats {
    pub count: usize,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Per-group summary produced by the `query` action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub groups: BTreeMap<String, GroupStats>,
    pub total: usize,
}

impl GroupReport {
    /// Groups `records` by `group_field`
    ///
    /// Records are expected in ascending timestamp order, so the first and
    /// last timestamps seen per group are its bounds.
    pub fn build(records: &[Record], group_field: &str, timestamp_field: &str) -> Self {
        let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

        for record in records {
            let key = record
                .field_text(group_field)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| UNGROUPED.to_string());
            let timestamp = record.field_text(timestamp_field);

            let stats = groups.entry(key).or_insert_with(|| GroupStats {
                count: 0,
                first: timestamp.clone(),
                last: None,
            });
            stats.count += 1;
            if timestamp.is_some() {
                if stats.first.is_none() {
                    stats.first = timestamp.clone();
                }
                stats.last = timestamp;
            }
        }

        Self {
            groups,
            total: records.len(),
        }
    }

    /// Report lines, one per group, then a total
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .groups
            .iter()
            .map(|(name, stats)| {
                format!(
                    "{name}: {} record(s), {} .. {}",
                    stats.count,
                    stats.first.as_deref().unwrap_or("-"),
                    stats.last.as_deref().unwrap_or("-")
                )
            })
            .collect();
        lines.push(format!(
            "Total: {} record(s) in {} group(s)",
            self.total,
            self.groups.len()
        ));
        lines
    }
}
