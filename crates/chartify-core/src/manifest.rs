//! Decoded Kubernetes manifests
//!
//! A [`Manifest`] is one rendered object: its identity plus the raw JSON tree
//! that processors decode into typed `k8s-openapi` structs. Multi-document
//! YAML streams and `kind: List` wrappers are flattened on parse.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};
use crate::gvk::{Gvk, ObjectRef};

/// A single decoded resource
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    gvk: Gvk,
    name: String,
    namespace: Option<String>,
    raw: JsonValue,
}

impl Manifest {
    /// Build a manifest from an already decoded object tree
    pub fn from_value(raw: JsonValue) -> Result<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CoreError::invalid_manifest("document is not a mapping"))?;

        let api_version = obj
            .get("apiVersion")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CoreError::invalid_manifest("missing apiVersion"))?;
        let kind = obj
            .get("kind")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CoreError::invalid_manifest("missing kind"))?;

        let metadata = obj.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        Ok(Self {
            gvk: Gvk::from_api_version(api_version, kind),
            name,
            namespace,
            raw,
        })
    }

    /// Parse a (possibly multi-document) YAML stream
    ///
    /// Empty documents are skipped and `kind: List` documents are expanded
    /// into their items.
    pub fn parse_documents(content: &str) -> Result<Vec<Self>> {
        let mut manifests = Vec::new();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = JsonValue::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            push_flattened(value, &mut manifests)?;
        }

        Ok(manifests)
    }

    pub fn gvk(&self) -> &Gvk {
        &self.gvk
    }

    /// Plain declared name (empty when the manifest has none)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.gvk.clone(), self.name.clone()).with_namespace(self.namespace.clone())
    }

    /// `metadata.labels`, if any
    pub fn labels(&self) -> Option<&Map<String, JsonValue>> {
        self.metadata_map("labels")
    }

    /// `metadata.annotations`, if any
    pub fn annotations(&self) -> Option<&Map<String, JsonValue>> {
        self.metadata_map("annotations")
    }

    /// Decode into a typed resource
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.raw)
    }

    fn metadata_map(&self, key: &str) -> Option<&Map<String, JsonValue>> {
        self.raw
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(JsonValue::as_object)
    }
}

fn push_flattened(value: JsonValue, out: &mut Vec<Manifest>) -> Result<()> {
    let is_list = value
        .get("kind")
        .and_then(JsonValue::as_str)
        .is_some_and(|kind| kind == "List" || kind.ends_with("List"))
        && value.get("items").is_some_and(JsonValue::is_array);

    if !is_list {
        out.push(Manifest::from_value(value)?);
        return Ok(());
    }

    if let Some(JsonValue::Array(items)) = value.get("items") {
        for item in items {
            if !item.is_null() {
                push_flattened(item.clone(), out)?;
            }
        }
    }
    Ok(())
}
