//! ConfigMap processor: data stays literal

use chartify_core::{AppMetadata, Manifest, Template};
use k8s_openapi::api::core::v1::ConfigMap;

use crate::error::Result;
use crate::processor::{Processor, TemplateBuilder, decode};

pub struct ConfigMapProcessor;

impl Processor for ConfigMapProcessor {
    fn name(&self) -> &'static str {
        "configmap"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("", "v1", "ConfigMap")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let config_map: ConfigMap = decode(obj, "ConfigMap")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        if let Some(immutable) = config_map.immutable {
            builder.field("immutable", immutable.into());
        }
        // raw sections keep the input key order
        for key in ["data", "binaryData"] {
            if let Some(section) = obj.raw().get(key).filter(|v| !v.is_null()) {
                builder.field(key, section.clone());
            }
        }

        builder.finish()
    }
}
