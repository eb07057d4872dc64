//! Linearize nested query result rows into `label:value` pairs.
//!
//! Result rows arrive as objects keyed by field name, where each cell is an
//! object carrying a `value` member. Pivoted fields nest one level deeper,
//! keyed by pivot value:
//!
//! ```json
//! {"orders.status": {"value": "complete"},
//!  "orders.count": {"2024": {"value": 10}, "2025": {"value": 12}}}
//! ```
//!
//! flattens to `orders.status:complete,count 2024:10,count 2025:12`.

use serde_json::Value;

use crate::constants::prompt::{PAIR_SEPARATOR, VALUE_FIELD};
use crate::types::FlatRow;

/// Flatten one row into its ordered `label:value` pairs.
pub fn flatten_values(row: &Value) -> Vec<String> {
    let mut pairs = Vec::new();
    collect_pairs(row, None, &mut pairs);
    pairs
}

/// Flatten one row into a single comma-joined line.
pub fn flatten_row(row: &Value) -> FlatRow {
    flatten_values(row).join(PAIR_SEPARATOR)
}

/// Flatten every row, preserving row order.
pub fn flatten_rows(rows: &[Value]) -> Vec<FlatRow> {
    rows.iter().map(flatten_row).collect()
}

fn collect_pairs(node: &Value, prefix: Option<&str>, out: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                visit_child(key, child, prefix, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit_child(&idx.to_string(), child, prefix, out);
            }
        }
        _ => {}
    }
}

fn visit_child(key: &str, child: &Value, prefix: Option<&str>, out: &mut Vec<String>) {
    if let Some(value) = cell_value(child) {
        out.push(format!("{}:{}", pivot_label(prefix, key), render_scalar(value)));
    } else if !is_empty_container(child) {
        collect_pairs(child, Some(key), out);
    }
}

/// Non-null `value` member of an object cell.
fn cell_value(node: &Value) -> Option<&Value> {
    node.as_object()
        .and_then(|map| map.get(VALUE_FIELD))
        .filter(|value| !value.is_null())
}

fn is_empty_container(node: &Value) -> bool {
    match node {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        // Scalars are not containers and are never visited.
        _ => true,
    }
}

/// `key` at the top level; `"<field> <key>"` under a `view.field` parent.
fn pivot_label(prefix: Option<&str>, key: &str) -> String {
    match prefix.filter(|prefix| !prefix.is_empty()) {
        Some(prefix) => {
            let field = prefix
                .split_once('.')
                .map(|(_, rest)| rest.split('.').next().unwrap_or(rest))
                .unwrap_or(prefix);
            format!("{field} {key}")
        }
        None => key.to_string(),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
