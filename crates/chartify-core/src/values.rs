//! Values accumulation with conflict detection
//!
//! Every processor records the concrete values its template expressions
//! point at. Entries are keyed by `root.path.leaf`; writing the same value
//! twice is a no-op, writing a different one is a [`CoreError::ValuesConflict`].
//! Mappings keep first-insertion order so output is stable across runs.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::template::Templated;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(JsonValue),
    Branch(IndexMap<String, Node>),
}

impl Node {
    fn has_leaves(&self) -> bool {
        match self {
            Node::Leaf(_) => true,
            Node::Branch(children) => children.values().any(Node::has_leaves),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Node::Leaf(value) => value.clone(),
            Node::Branch(children) => JsonValue::Object(
                children
                    .iter()
                    .filter(|(_, child)| child.has_leaves())
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
        }
    }

    fn describe(&self) -> String {
        match self {
            Node::Leaf(value) => value.to_string(),
            Node::Branch(_) => "<mapping>".to_string(),
        }
    }
}

/// Accumulated values document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    root: IndexMap<String, Node>,
}

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `root.path.leaf` and return the inline lookup
    /// expression for it.
    ///
    /// `path` is a dot- or slash-separated list of intermediate keys and may
    /// be empty.
    pub fn add(
        &mut self,
        root: &str,
        path: &str,
        leaf: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Templated> {
        let keys = key_path(root, path, leaf)?;
        self.insert(&keys, value.into())?;
        Ok(Templated::values_lookup(&keys.join(".")))
    }

    /// Like [`Values::add`], but the returned expression renders the stored
    /// subtree as YAML in place of the field.
    pub fn add_block(
        &mut self,
        root: &str,
        path: &str,
        leaf: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Templated> {
        let keys = key_path(root, path, leaf)?;
        self.insert(&keys, value.into())?;
        Ok(Templated::Block(format!(".Values.{}", keys.join("."))))
    }

    /// Record `value` and return its dotted path (`root.path.leaf`) for
    /// callers composing their own expression around it.
    pub fn record(
        &mut self,
        root: &str,
        path: &str,
        leaf: &str,
        value: impl Into<JsonValue>,
    ) -> Result<String> {
        let keys = key_path(root, path, leaf)?;
        self.insert(&keys, value.into())?;
        Ok(keys.join("."))
    }

    /// Fold another accumulator into this one with the same conflict policy
    pub fn merge(&mut self, other: &Values) -> Result<()> {
        for (keys, value) in other.leaf_entries() {
            self.insert(&keys, value.clone())?;
        }
        Ok(())
    }

    /// Look up a leaf or mapping by dotted path
    pub fn get(&self, path: &str) -> Option<JsonValue> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut node = self.root.get(first)?;
        for part in parts {
            match node {
                Node::Branch(children) => node = children.get(part)?,
                Node::Leaf(_) => return None,
            }
        }
        Some(node.to_json())
    }

    /// All leaves as `(dotted path, value)` in insertion order
    pub fn leaves(&self) -> Vec<(String, &JsonValue)> {
        self.leaf_entries()
            .into_iter()
            .map(|(keys, value)| (keys.join("."), value))
            .collect()
    }

    /// Check if no leaf has been recorded
    pub fn is_empty(&self) -> bool {
        !self.root.values().any(Node::has_leaves)
    }

    /// Convert to a JSON value, omitting mappings without leaves
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.root
                .iter()
                .filter(|(_, node)| node.has_leaves())
                .map(|(key, node)| (key.clone(), node.to_json()))
                .collect(),
        )
    }

    /// Serialize the whole document as YAML
    pub fn to_yaml(&self) -> Result<String> {
        if self.is_empty() {
            return Ok("{}\n".to_string());
        }
        Ok(serde_yaml::to_string(&self.to_json())?)
    }

    fn insert(&mut self, keys: &[String], value: JsonValue) -> Result<()> {
        let Some((leaf, parents)) = keys.split_last() else {
            return Err(CoreError::invalid_input("empty values path"));
        };

        let mut map = &mut self.root;
        for (depth, key) in parents.iter().enumerate() {
            let node = map
                .entry(key.clone())
                .or_insert_with(|| Node::Branch(IndexMap::new()));
            match node {
                Node::Branch(children) => map = children,
                Node::Leaf(existing) => {
                    return Err(CoreError::ValuesConflict {
                        path: keys[..=depth].join("."),
                        existing: existing.to_string(),
                        incoming: "<mapping>".to_string(),
                    });
                }
            }
        }

        match map.get(leaf) {
            None => {
                map.insert(leaf.clone(), Node::Leaf(value));
                Ok(())
            }
            Some(Node::Leaf(existing)) if *existing == value => Ok(()),
            Some(existing) => Err(CoreError::ValuesConflict {
                path: keys.join("."),
                existing: existing.describe(),
                incoming: value.to_string(),
            }),
        }
    }

    fn leaf_entries(&self) -> Vec<(Vec<String>, &JsonValue)> {
        fn walk<'a>(
            map: &'a IndexMap<String, Node>,
            prefix: &mut Vec<String>,
            out: &mut Vec<(Vec<String>, &'a JsonValue)>,
        ) {
            for (key, node) in map {
                prefix.push(key.clone());
                match node {
                    Node::Leaf(value) => out.push((prefix.clone(), value)),
                    Node::Branch(children) => walk(children, prefix, out),
                }
                prefix.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Split `root`, `path` and `leaf` into key segments
fn key_path(root: &str, path: &str, leaf: &str) -> Result<Vec<String>> {
    if root.is_empty() {
        return Err(CoreError::invalid_input("values root key is empty"));
    }
    if leaf.is_empty() {
        return Err(CoreError::invalid_input(format!(
            "values leaf key is empty under '{root}'"
        )));
    }

    let mut keys = vec![root.to_string()];
    keys.extend(
        path.split(['.', '/'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    );
    keys.push(leaf.to_string());
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_returns_lookup() {
        let mut values = Values::new();
        let expr = values.add("web", "", "replicas", 3).unwrap();
        assert_eq!(expr.as_str(), "{{ .Values.web.replicas }}");
        assert_eq!(values.get("web.replicas"), Some(json!(3)));
    }

    #[test]
    fn test_add_nested_path() {
        let mut values = Values::new();
        values.add("web", "nginx/image", "tag", "1.25").unwrap();
        values.add("web", "nginx.image", "repository", "nginx").unwrap();
        assert_eq!(
            values.get("web.nginx.image"),
            Some(json!({"tag": "1.25", "repository": "nginx"}))
        );
    }

    #[test]
    fn test_identical_add_is_noop() {
        let mut values = Values::new();
        values.add("ing", "", "host", "example.com").unwrap();
        values.add("ing", "", "host", "example.com").unwrap();
        assert_eq!(values.leaves().len(), 1);
    }

    #[test]
    fn test_conflicting_add_fails() {
        let mut values = Values::new();
        values.add("ing", "", "host", "a.example.com").unwrap();
        let err = values.add("ing", "", "host", "b.example.com").unwrap_err();
        match err {
            CoreError::ValuesConflict { path, existing, incoming } => {
                assert_eq!(path, "ing.host");
                assert_eq!(existing, "\"a.example.com\"");
                assert_eq!(incoming, "\"b.example.com\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_descending_through_leaf_fails() {
        let mut values = Values::new();
        values.add("web", "", "image", "nginx").unwrap();
        let err = values.add("web", "image", "tag", "1.0").unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_leaf_over_mapping_fails() {
        let mut values = Values::new();
        values.add("web", "image", "tag", "1.0").unwrap();
        let err = values.add("web", "", "image", "nginx").unwrap_err();
        assert!(err.to_string().contains("<mapping>"));
    }

    #[test]
    fn test_record_returns_path() {
        let mut values = Values::new();
        let path = values.record("db", "", "password", "s3cret").unwrap();
        assert_eq!(path, "db.password");
        assert_eq!(values.get("db.password"), Some(json!("s3cret")));
    }

    #[test]
    fn test_block_values() {
        let mut values = Values::new();
        let expr = values
            .add_block("web", "", "ports", json!([{"port": 80}]))
            .unwrap();
        assert_eq!(expr, Templated::Block(".Values.web.ports".to_string()));
    }

    #[test]
    fn test_merge_preserves_order_and_detects_conflict() {
        let mut a = Values::new();
        a.add("b", "", "x", 1).unwrap();
        a.add("a", "", "x", 2).unwrap();

        let mut b = Values::new();
        b.add("a", "", "x", 2).unwrap();
        b.add("c", "", "y", "z").unwrap();

        a.merge(&b).unwrap();
        let keys: Vec<String> = a.leaves().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b.x", "a.x", "c.y"]);

        let mut conflicting = Values::new();
        conflicting.add("b", "", "x", 5).unwrap();
        assert!(a.merge(&conflicting).unwrap_err().is_conflict());
    }

    #[test]
    fn test_empty_keys_rejected() {
        let mut values = Values::new();
        assert!(values.add("", "", "x", 1).is_err());
        assert!(values.add("root", "", "", 1).is_err());
    }

    #[test]
    fn test_yaml_output_is_stable() {
        let build = || {
            let mut values = Values::new();
            values.add("web", "", "replicas", 2).unwrap();
            values.add("web", "nginx.image", "repository", "nginx").unwrap();
            values.add("ingress", "", "host", "example.com").unwrap();
            values
        };
        let first = build().to_yaml().unwrap();
        let second = build().to_yaml().unwrap();
        assert_eq!(first, second);
        assert!(first.find("web:").unwrap() < first.find("ingress:").unwrap());
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Values::new().to_yaml().unwrap(), "{}\n");
    }
}
