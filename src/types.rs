//! Common types for the dashboard worker
//!
//! All shared data structures used across modules.
//!
//! Remote collections are consumed as opaque JSON records: the worker never
//! models the server's schema beyond the handful of fields a screen sorts,
//! searches or joins on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::view::ViewState;

/// One item of a remote collection, as returned by a source call.
///
/// Field shapes are source-defined; only the identifier, the sort key and
/// the searchable fields of a screen are ever interpreted.
pub type Record = serde_json::Map<String, Value>;

/// String representation of a record field, for searching, sorting and
/// identifier extraction. Missing fields and JSON nulls yield `None`.
pub fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric value of a record field. Missing, null and unparseable values
/// are treated as zero, as are non-finite parses.
pub fn field_number(record: &Record, field: &str) -> f64 {
    let value = match record.get(field) {
        Some(v) => v,
        None => return 0.0,
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() { parsed } else { 0.0 }
}

/// API response for a projected list screen
#[derive(Debug, Serialize, Deserialize)]
pub struct ListViewResponse {
    /// The currently visible window of the collection
    pub items: Vec<Record>,

    /// Total item count after filtering, before pagination
    pub filtered_count: usize,

    /// Number of pages the filtered collection spans
    pub page_count: usize,

    /// The view state the window was derived from
    pub state: ViewState,
}
