//! Service processor

use chartify_core::{AppMetadata, Manifest, Template};
use k8s_openapi::api::core::v1::Service;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::fields;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

/// Moves the service type and ports to values and points the selector at
/// the chart's selector labels
pub struct ServiceProcessor;

impl Processor for ServiceProcessor {
    fn name(&self) -> &'static str {
        "service"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("", "v1", "Service")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let service: Service = decode(obj, "Service")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(spec) = &service.spec else {
            return builder.finish();
        };
        let mut value = encode(obj, spec)?;

        if let Some(service_type) = spec.type_.as_deref() {
            let expr = builder.add("", "type", service_type)?;
            fields::set(&mut value, "/type", &expr);
        }

        if let Some(ports) = spec.ports.as_ref().filter(|p| !p.is_empty()) {
            let expr = builder.add_block("", "ports", encode(obj, ports)?)?;
            fields::set(&mut value, "/ports", &expr);
        }

        if let Some(selector) = &spec.selector {
            let labels: Map<String, JsonValue> = selector
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect();
            if let Some(field) = value.pointer_mut("/selector") {
                *field = builder.header.selector_labels(Some(&labels));
            }
        }

        builder.field("spec", value);
        builder.finish()
    }
}
