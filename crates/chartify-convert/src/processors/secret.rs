//! Secret processor
//!
//! Secret material never stays in templates: each `data` and `stringData`
//! entry moves to values and the template demands it back with `required`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chartify_core::{AppMetadata, Manifest, Template, Templated, lower_camel};
use k8s_openapi::api::core::v1::Secret;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::processor::{Processor, TemplateBuilder, decode};

pub struct SecretProcessor;

impl SecretProcessor {
    /// Keys of a data section in input order
    fn keys<'o>(obj: &'o Manifest, section: &str) -> Vec<&'o String> {
        obj.raw()
            .get(section)
            .and_then(JsonValue::as_object)
            .map(|map| map.keys().collect())
            .unwrap_or_default()
    }
}

fn required(path: &str, pipeline: Option<&str>) -> Templated {
    let lookup = format!("required \"{path} is required\" .Values.{path}");
    match pipeline {
        Some(pipeline) => Templated::Inline(format!("{{{{ {lookup} | {pipeline} }}}}")),
        None => Templated::Inline(format!("{{{{ {lookup} }}}}")),
    }
}

impl Processor for SecretProcessor {
    fn name(&self) -> &'static str {
        "secret"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("", "v1", "Secret")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let secret: Secret = decode(obj, "Secret")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        if let Some(immutable) = secret.immutable {
            builder.field("immutable", immutable.into());
        }
        if let Some(secret_type) = &secret.type_ {
            builder.field("type", secret_type.as_str().into());
        }

        if let Some(data) = &secret.data {
            let mut section = Map::new();
            for key in Self::keys(obj, "data") {
                let Some(bytes) = data.get(key) else {
                    continue;
                };
                let expr = match std::str::from_utf8(&bytes.0) {
                    Ok(text) => {
                        let path = builder.record("", &lower_camel(key), text)?;
                        required(&path, Some("b64enc"))
                    }
                    Err(_) => {
                        let path = builder.record("", &lower_camel(key), STANDARD.encode(&bytes.0))?;
                        required(&path, None)
                    }
                };
                section.insert(key.clone(), expr.to_json());
            }
            builder.field("data", JsonValue::Object(section));
        }

        if let Some(string_data) = &secret.string_data {
            let mut section = Map::new();
            for key in Self::keys(obj, "stringData") {
                let Some(text) = string_data.get(key) else {
                    continue;
                };
                let path = builder.record("", &lower_camel(key), text.as_str())?;
                section.insert(key.clone(), required(&path, Some("quote")).to_json());
            }
            builder.field("stringData", JsonValue::Object(section));
        }

        builder.finish()
    }
}
