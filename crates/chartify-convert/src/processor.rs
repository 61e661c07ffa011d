//! The processor contract and helpers shared by implementations

use chartify_core::yaml;
use chartify_core::{AppMetadata, Manifest, Template, Templated, Values};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ConvertError, ObjectContext, Result};
use crate::meta::ObjectHeader;

/// Turns one kind of object into a chart template
///
/// Implementations are stateless; everything that outlives a call lives in
/// the [`AppMetadata`] passed in or in the returned [`Template`].
pub trait Processor: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether this processor is responsible for `obj`.
    ///
    /// Must only look at the object identity.
    fn applies(&self, obj: &Manifest) -> bool;

    /// Build the template for an object this processor applies to
    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template>;

    /// `Ok(None)` when not claimed, otherwise the outcome of the claim
    fn process(&self, app: &AppMetadata, obj: &Manifest) -> Result<Option<Template>> {
        if !self.applies(obj) {
            return Ok(None);
        }
        self.template(app, obj).map(Some)
    }
}

/// Decode `obj` into the typed struct for its kind
pub(crate) fn decode<T: DeserializeOwned>(obj: &Manifest, kind: &'static str) -> Result<T> {
    obj.decode().map_err(|source| ConvertError::Decode {
        object: obj.object_ref(),
        kind,
        source,
    })
}

/// Re-encode a typed section; unset optional fields disappear
pub(crate) fn encode<T: Serialize>(obj: &Manifest, section: &T) -> Result<JsonValue> {
    serde_json::to_value(section).for_object(obj)
}

/// `<trimmed name>-<kind>.yaml`
pub fn template_filename(app: &AppMetadata, obj: &Manifest) -> String {
    format!(
        "{}-{}.yaml",
        app.trimmed_name(obj.name()),
        obj.gvk().kind.to_ascii_lowercase()
    )
}

/// Header plus top-level body fields, rendered as one template
pub(crate) struct TemplateBuilder<'a> {
    app: &'a AppMetadata,
    obj: &'a Manifest,
    pub header: ObjectHeader,
    pub values: Values,
    /// Values root key for this object
    pub root: String,
    body: Map<String, JsonValue>,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(app: &'a AppMetadata, obj: &'a Manifest) -> Result<Self> {
        let header = ObjectHeader::build(app, obj)?;
        Ok(Self {
            app,
            obj,
            header,
            values: Values::new(),
            root: app.templated_name(obj.name()),
            body: Map::new(),
        })
    }

    pub fn app(&self) -> &'a AppMetadata {
        self.app
    }

    pub fn obj(&self) -> &'a Manifest {
        self.obj
    }

    /// Add a top-level field after `metadata`; `null` is skipped
    pub fn field(&mut self, key: &str, value: JsonValue) {
        if !value.is_null() {
            self.body.insert(key.to_string(), value);
        }
    }

    /// Record a value under this object's root and return its expression
    pub fn add(
        &mut self,
        path: &str,
        leaf: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Templated> {
        self.values
            .add(&self.root, path, leaf, value)
            .for_object(self.obj)
    }

    pub fn add_block(
        &mut self,
        path: &str,
        leaf: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Templated> {
        self.values
            .add_block(&self.root, path, leaf, value)
            .for_object(self.obj)
    }

    /// Record a value and return its dotted path
    pub fn record(&mut self, path: &str, leaf: &str, value: impl Into<JsonValue>) -> Result<String> {
        self.values
            .record(&self.root, path, leaf, value)
            .for_object(self.obj)
    }

    pub fn finish(self) -> Result<Template> {
        let mut document = match self.header.to_json() {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        document.extend(self.body);
        let content = yaml::render(&JsonValue::Object(document), 0).for_object(self.obj)?;

        Ok(Template::new(
            self.obj.object_ref(),
            template_filename(self.app, self.obj),
            content,
            self.values,
        ))
    }
}
