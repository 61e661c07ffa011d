//! Object metadata builder
//!
//! Builds the header shared by every generated template:
//!
//! ```yaml
//! apiVersion: apps/v1
//! kind: Deployment
//! metadata:
//!   name: {{ include "app.fullname" . }}-web
//!   labels:
//!     tier: frontend
//!   {{- include "app.labels" . | nindent 4 }}
//! ```

use chartify_core::yaml::{self, with_include};
use chartify_core::{AppMetadata, Manifest, Templated};
use serde_json::{Map, Value as JsonValue};

use crate::error::{ConvertError, ObjectContext, Result};

/// Labels emitted by the chart's `labels` helper
const MANAGED_LABELS: &[&str] = &[
    "helm.sh/chart",
    "app.kubernetes.io/name",
    "app.kubernetes.io/instance",
    "app.kubernetes.io/version",
    "app.kubernetes.io/managed-by",
];

/// Labels emitted by the chart's `selectorLabels` helper
const SELECTOR_LABELS: &[&str] = &["app.kubernetes.io/name", "app.kubernetes.io/instance"];

/// Annotations written by the rendering tool rather than the author
const GENERATED_ANNOTATIONS: &[&str] = &[
    "kubectl.kubernetes.io/last-applied-configuration",
    "meta.helm.sh/release-name",
    "meta.helm.sh/release-namespace",
];

/// Common template header for one object
#[derive(Debug, Clone)]
pub struct ObjectHeader {
    pub api_version: String,
    pub kind: String,
    /// Templated reference to the object's own name
    pub name: Templated,
    /// Literal labels, managed ones removed
    pub labels: Map<String, JsonValue>,
    /// Literal annotations merged with chart-wide ones
    pub annotations: Map<String, JsonValue>,
    labels_helper: Templated,
    selector_helper: Templated,
}

impl ObjectHeader {
    /// Build the header for `obj`
    ///
    /// Registers the object's name with the name registry.
    pub fn build(app: &AppMetadata, obj: &Manifest) -> Result<Self> {
        let name = obj.name();
        if name.is_empty() {
            return Err(ConvertError::invalid_input(obj, "metadata.name is missing or empty"));
        }
        if app.trimmed_name(name).is_empty() {
            return Err(ConvertError::invalid_input(
                obj,
                format!("name '{name}' is empty once the chart prefix is removed"),
            ));
        }
        app.names().register(name);
        if let Some(other) = app.names().collision(name) {
            tracing::warn!(
                "{} and '{}' share the values key '{}'",
                obj.object_ref(),
                other,
                app.templated_name(name)
            );
        }

        let labels = obj
            .labels()
            .map(|labels| without(labels, MANAGED_LABELS))
            .unwrap_or_default();

        let mut annotations = obj
            .annotations()
            .map(|annotations| without(annotations, GENERATED_ANNOTATIONS))
            .unwrap_or_default();
        for (key, value) in &app.config().annotations {
            annotations
                .entry(key.clone())
                .or_insert_with(|| JsonValue::String(value.clone()));
        }

        Ok(Self {
            api_version: obj.gvk().api_version(),
            kind: obj.gvk().kind.clone(),
            name: app.templated_reference(name),
            labels,
            annotations,
            labels_helper: app.helper("labels"),
            selector_helper: app.helper("selectorLabels"),
        })
    }

    /// Selector mapping: literal selector labels plus the chart's
    /// `selectorLabels` helper
    pub fn selector_labels(&self, labels: Option<&Map<String, JsonValue>>) -> JsonValue {
        let literal = labels
            .map(|labels| without(labels, SELECTOR_LABELS))
            .unwrap_or_default();
        with_include(literal, &self.selector_helper)
    }

    /// The `metadata` mapping
    pub fn metadata(&self) -> JsonValue {
        let mut metadata = Map::new();
        metadata.insert("name".to_string(), self.name.to_json());
        metadata.insert(
            "labels".to_string(),
            with_include(self.labels.clone(), &self.labels_helper),
        );
        if !self.annotations.is_empty() {
            metadata.insert(
                "annotations".to_string(),
                JsonValue::Object(self.annotations.clone()),
            );
        }
        JsonValue::Object(metadata)
    }

    pub fn to_json(&self) -> JsonValue {
        let mut header = Map::new();
        header.insert("apiVersion".to_string(), JsonValue::String(self.api_version.clone()));
        header.insert("kind".to_string(), JsonValue::String(self.kind.clone()));
        header.insert("metadata".to_string(), self.metadata());
        JsonValue::Object(header)
    }

    /// Header as template text
    pub fn render(&self, obj: &Manifest) -> Result<String> {
        yaml::render(&self.to_json(), 0).for_object(obj)
    }
}

/// Copy of `map` without the given keys
pub(crate) fn without(map: &Map<String, JsonValue>, keys: &[&str]) -> Map<String, JsonValue> {
    map.iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
