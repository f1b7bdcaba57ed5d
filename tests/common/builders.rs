//! Helpers for building test data.

use serde_json::{Map, Value};

/// Build a property map from a JSON object literal.
///
/// Panics when `value` is not an object.
pub fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
