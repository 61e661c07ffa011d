//! Fallback for kinds without a dedicated processor
//!
//! Only registered on request; it claims everything, so it must come last.

use chartify_core::{AppMetadata, Manifest, Template};

use crate::error::Result;
use crate::processor::{Processor, TemplateBuilder};

const SKIPPED_FIELDS: &[&str] = &["apiVersion", "kind", "metadata", "status"];

pub struct GenericProcessor;

impl Processor for GenericProcessor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn applies(&self, _obj: &Manifest) -> bool {
        true
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let mut builder = TemplateBuilder::new(app, obj)?;
        if let Some(fields) = obj.raw().as_object() {
            for (key, value) in fields {
                if !SKIPPED_FIELDS.contains(&key.as_str()) {
                    builder.field(key, value.clone());
                }
            }
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::ChartConfig;

    #[test]
    fn test_generic_keeps_body() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let obj = Manifest::parse_documents(
            r#"
apiVersion: monitoring.coreos.com/v1
kind: ServiceMonitor
metadata:
  name: app-metrics
spec:
  endpoints:
    - port: http
status:
  ready: true
"#,
        )
        .unwrap()
        .remove(0);

        let template = GenericProcessor.process(&app, &obj).unwrap().unwrap();
        assert_eq!(template.filename, "metrics-servicemonitor.yaml");
        assert!(template.content.starts_with("apiVersion: monitoring.coreos.com/v1\nkind: ServiceMonitor\n"));
        assert!(template.content.contains("spec:\n  endpoints:\n  - port: http\n"), "{}", template.content);
        assert!(!template.content.contains("status"));
    }
}
