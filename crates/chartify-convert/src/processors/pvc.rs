//! PersistentVolumeClaim processor

use chartify_core::{AppMetadata, Manifest, Template, Templated};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;

use crate::error::Result;
use crate::fields;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

/// Storage class and requested size become values
pub struct PvcProcessor;

impl Processor for PvcProcessor {
    fn name(&self) -> &'static str {
        "pvc"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("", "v1", "PersistentVolumeClaim")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let claim: PersistentVolumeClaim = decode(obj, "PersistentVolumeClaim")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(spec) = &claim.spec else {
            return builder.finish();
        };
        let mut value = encode(obj, spec)?;

        if let Some(class) = &spec.storage_class_name {
            let path = builder.record("", "storageClass", class.as_str())?;
            fields::set(
                &mut value,
                "/storageClassName",
                &Templated::values_pipeline(&path, "quote"),
            );
        }

        let request = spec
            .resources
            .as_ref()
            .and_then(|r| r.requests.as_ref())
            .and_then(|requests| requests.get("storage"));
        if let Some(quantity) = request {
            let expr = builder.add("", "storageRequest", quantity.0.as_str())?;
            fields::set(&mut value, "/resources/requests/storage", &expr);
        }

        builder.field("spec", value);
        builder.finish()
    }
}
