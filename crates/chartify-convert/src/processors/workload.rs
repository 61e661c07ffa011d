//! Deployments, StatefulSets and DaemonSets

use chartify_core::{AppMetadata, Manifest, Template};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ConvertError, Result};
use crate::fields;
use crate::pod;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

const KINDS: &[&str] = &["Deployment", "StatefulSet", "DaemonSet"];

/// Typed view of the fields shared by the workload kinds
struct Workload {
    replicas: Option<i32>,
    selector: LabelSelector,
    template: PodTemplateSpec,
    spec: JsonValue,
}

pub struct WorkloadProcessor;

impl WorkloadProcessor {
    fn decode(obj: &Manifest) -> Result<Option<Workload>> {
        let workload = match obj.gvk().kind.as_str() {
            "Deployment" => decode::<Deployment>(obj, "Deployment")?
                .spec
                .map(|spec| -> Result<Workload> {
                    Ok(Workload {
                        replicas: spec.replicas,
                        spec: encode(obj, &spec)?,
                        selector: spec.selector,
                        template: spec.template,
                    })
                })
                .transpose()?,
            "StatefulSet" => decode::<StatefulSet>(obj, "StatefulSet")?
                .spec
                .map(|spec| -> Result<Workload> {
                    Ok(Workload {
                        replicas: spec.replicas,
                        spec: encode(obj, &spec)?,
                        selector: spec.selector,
                        template: spec.template,
                    })
                })
                .transpose()?,
            "DaemonSet" => decode::<DaemonSet>(obj, "DaemonSet")?
                .spec
                .map(|spec| -> Result<Workload> {
                    Ok(Workload {
                        replicas: None,
                        spec: encode(obj, &spec)?,
                        selector: spec.selector,
                        template: spec.template,
                    })
                })
                .transpose()?,
            other => {
                return Err(ConvertError::invalid_input(
                    obj,
                    format!("{other} is not a workload kind"),
                ));
            }
        };
        Ok(workload)
    }
}

impl Processor for WorkloadProcessor {
    fn name(&self) -> &'static str {
        "workload"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        let gvk = obj.gvk();
        gvk.group == "apps" && gvk.version == "v1" && KINDS.contains(&gvk.kind.as_str())
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let workload = Self::decode(obj)?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(workload) = workload else {
            return builder.finish();
        };
        let mut spec = workload.spec;

        if let Some(replicas) = workload.replicas {
            let expr = builder.add("", "replicas", replicas)?;
            fields::set(&mut spec, "/replicas", &expr);
        }

        if let Some(match_labels) = &workload.selector.match_labels {
            let labels: Map<String, JsonValue> = match_labels
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect();
            if let Some(field) = spec.pointer_mut("/selector/matchLabels") {
                *field = builder.header.selector_labels(Some(&labels));
            }
        }

        fields::reference(app, &mut spec, "/serviceName");

        let template = pod::pod_template(&mut builder, &workload.template)?;
        if let Some(field) = spec.pointer_mut("/template") {
            *field = template;
        }

        builder.field("spec", spec);
        builder.finish()
    }
}
