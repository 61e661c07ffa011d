//! Templated strings and rendered template artifacts

use serde_json::Value as JsonValue;
use std::fmt;

use crate::gvk::ObjectRef;
use crate::values::Values;
use crate::yaml::{BLOCK_MARKER, INLINE_MARKER};

/// A field value that is a template expression rather than a literal
///
/// Processors never write raw `{{ ... }}` strings into resource fields;
/// they obtain a `Templated` from the name registry or the values
/// accumulator and place it with [`Templated::to_json`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Templated {
    /// Expression text substituted into a scalar, e.g.
    /// `{{ include "app.fullname" . }}-web`
    Inline(String),
    /// A values path whose subtree replaces the whole field, rendered as
    /// `{{- toYaml <path> | nindent N }}`
    Block(String),
    /// Helper call merged into a literal mapping, rendered as
    /// `{{- <call> | nindent N }}`
    Include(String),
}

impl Templated {
    /// `{{ .Values.<path> }}`
    pub fn values_lookup(path: &str) -> Self {
        Self::Inline(format!("{{{{ .Values.{path} }}}}"))
    }

    /// `{{ .Values.<path> | <pipeline> }}`
    pub fn values_pipeline(path: &str, pipeline: &str) -> Self {
        Self::Inline(format!("{{{{ .Values.{path} | {pipeline} }}}}"))
    }

    /// The raw expression text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(s) | Self::Block(s) | Self::Include(s) => s,
        }
    }

    /// Encode for placement in a JSON tree that will go through
    /// [`crate::yaml::render`]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Inline(expr) => JsonValue::String(format!("{INLINE_MARKER}{expr}")),
            Self::Block(path) => JsonValue::String(format!("{BLOCK_MARKER}{path}")),
            Self::Include(call) => JsonValue::String(call.clone()),
        }
    }
}

impl fmt::Display for Templated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(expr) => f.write_str(expr),
            Self::Block(path) => write!(f, "{{{{- toYaml {path} }}}}"),
            Self::Include(call) => write!(f, "{{{{- {call} }}}}"),
        }
    }
}

impl From<Templated> for String {
    fn from(value: Templated) -> Self {
        value.to_string()
    }
}

/// One chart template produced for a claimed object
#[derive(Debug, Clone)]
pub struct Template {
    /// Object the template was generated from
    pub object: ObjectRef,
    /// File name under `templates/`
    pub filename: String,
    /// Literal template text
    pub content: String,
    /// Values referenced by `content`
    pub values: Values,
}

impl Template {
    pub fn new(object: ObjectRef, filename: impl Into<String>, content: impl Into<String>, values: Values) -> Self {
        Self {
            object,
            filename: filename.into(),
            content: content.into(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_lookup() {
        let t = Templated::values_lookup("web.replicas");
        assert_eq!(t.as_str(), "{{ .Values.web.replicas }}");
        assert_eq!(t.to_string(), "{{ .Values.web.replicas }}");
    }

    #[test]
    fn test_values_pipeline() {
        let t = Templated::values_pipeline("cron.schedule", "quote");
        assert_eq!(t.as_str(), "{{ .Values.cron.schedule | quote }}");
    }

    #[test]
    fn test_block_encodes_marker() {
        let t = Templated::Block(".Values.web.ports".to_string());
        assert_eq!(t.to_json(), JsonValue::String(format!("{BLOCK_MARKER}.Values.web.ports")));
    }
}
