//! JSON pointer helpers for rewriting re-encoded resource bodies

use chartify_core::{AppMetadata, Templated};
use serde_json::Value as JsonValue;

/// Non-empty string at `pointer`
pub(crate) fn string_at<'a>(value: &'a JsonValue, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}

/// Replace an existing field with a templated expression.
///
/// Returns `false` when the field is absent.
pub(crate) fn set(value: &mut JsonValue, pointer: &str, templated: &Templated) -> bool {
    match value.pointer_mut(pointer) {
        Some(field) => {
            *field = templated.to_json();
            true
        }
        None => false,
    }
}

/// Replace the object name at `pointer` with its templated reference
pub(crate) fn reference(app: &AppMetadata, value: &mut JsonValue, pointer: &str) {
    let Some(name) = string_at(value, pointer).map(str::to_string) else {
        return;
    };
    set(value, pointer, &app.templated_reference(&name));
}

/// Length of the array at `pointer`, zero when absent
pub(crate) fn len_at(value: &JsonValue, pointer: &str) -> usize {
    value
        .pointer(pointer)
        .and_then(JsonValue::as_array)
        .map_or(0, Vec::len)
}
