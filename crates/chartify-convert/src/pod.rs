//! Pod template handling shared by every workload kind
//!
//! Per container the image, pull policy and resources move to values under
//! `<root>.<container>`; every name pointing at another object (config maps,
//! secrets, claims, the service account) becomes a templated reference.

use chartify_core::{AppMetadata, Templated, lower_camel};
use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::fields;
use crate::processor::{TemplateBuilder, encode};

const ENV_REFERENCES: &[&str] = &["valueFrom/configMapKeyRef/name", "valueFrom/secretKeyRef/name"];
const ENV_FROM_REFERENCES: &[&str] = &["configMapRef/name", "secretRef/name"];
const VOLUME_REFERENCES: &[&str] = &[
    "configMap/name",
    "secret/secretName",
    "persistentVolumeClaim/claimName",
];
const PROJECTION_REFERENCES: &[&str] = &["configMap/name", "secret/name"];

/// Rewrite a pod template, recording its values in `builder`
pub(crate) fn pod_template(
    builder: &mut TemplateBuilder<'_>,
    template: &PodTemplateSpec,
) -> Result<JsonValue> {
    let app = builder.app();
    let mut value = encode(builder.obj(), template)?;

    let labels = value
        .pointer("/metadata/labels")
        .and_then(JsonValue::as_object)
        .cloned();
    if let Some(labels) = labels {
        let selector = builder.header.selector_labels(Some(&labels));
        if let Some(field) = value.pointer_mut("/metadata/labels") {
            *field = selector;
        }
    }

    let Some(spec) = &template.spec else {
        return Ok(value);
    };

    containers(builder, &mut value, "containers", &spec.containers)?;
    if let Some(init) = &spec.init_containers {
        containers(builder, &mut value, "initContainers", init)?;
    }

    volumes(app, &mut value);
    fields::reference(app, &mut value, "/spec/serviceAccountName");
    fields::reference(app, &mut value, "/spec/serviceAccount");

    if let Some(secrets) = spec.image_pull_secrets.as_ref().filter(|s| !s.is_empty()) {
        let secrets = encode(builder.obj(), secrets)?;
        let block = builder.add_block("", "imagePullSecrets", secrets)?;
        fields::set(&mut value, "/spec/imagePullSecrets", &block);
    }

    Ok(value)
}

fn containers(
    builder: &mut TemplateBuilder<'_>,
    value: &mut JsonValue,
    list: &str,
    containers: &[Container],
) -> Result<()> {
    let app = builder.app();

    for (i, container) in containers.iter().enumerate() {
        let base = format!("/spec/{list}/{i}");
        let key = lower_camel(&container.name);

        if let Some(image) = container.image.as_deref().filter(|s| !s.is_empty()) {
            let expr = image_expression(builder, &key, image)?;
            fields::set(value, &format!("{base}/image"), &expr);
        }

        if let Some(policy) = &container.image_pull_policy {
            let expr = builder.add(&key, "imagePullPolicy", policy.as_str())?;
            fields::set(value, &format!("{base}/imagePullPolicy"), &expr);
        }

        if let Some(resources) = &container.resources {
            let resources = encode(builder.obj(), resources)?;
            if resources.as_object().is_some_and(|r| !r.is_empty()) {
                let expr = builder.add_block(&key, "resources", resources)?;
                fields::set(value, &format!("{base}/resources"), &expr);
            }
        }

        for j in 0..fields::len_at(value, &format!("{base}/env")) {
            for pointer in ENV_REFERENCES {
                fields::reference(app, value, &format!("{base}/env/{j}/{pointer}"));
            }
        }
        for j in 0..fields::len_at(value, &format!("{base}/envFrom")) {
            for pointer in ENV_FROM_REFERENCES {
                fields::reference(app, value, &format!("{base}/envFrom/{j}/{pointer}"));
            }
        }
    }

    Ok(())
}

fn volumes(app: &AppMetadata, value: &mut JsonValue) {
    for i in 0..fields::len_at(value, "/spec/volumes") {
        for pointer in VOLUME_REFERENCES {
            fields::reference(app, value, &format!("/spec/volumes/{i}/{pointer}"));
        }
        let sources = format!("/spec/volumes/{i}/projected/sources");
        for j in 0..fields::len_at(value, &sources) {
            for pointer in PROJECTION_REFERENCES {
                fields::reference(app, value, &format!("{sources}/{j}/{pointer}"));
            }
        }
    }
}

/// `{{ repository }}:{{ tag }}` with both parts recorded under
/// `<root>.<container>.image`
fn image_expression(builder: &mut TemplateBuilder<'_>, key: &str, image: &str) -> Result<Templated> {
    let image = ImageRef::parse(image);
    let path = format!("{key}.image");
    let repository = builder.record(&path, "repository", image.repository)?;

    let expr = match image.version {
        ImageVersion::Tag(tag) => {
            let tag = builder.record(&path, "tag", tag)?;
            format!("{{{{ .Values.{repository} }}}}:{{{{ .Values.{tag} | default .Chart.AppVersion }}}}")
        }
        ImageVersion::Digest(digest) => {
            let tag = builder.record(&path, "tag", digest)?;
            format!("{{{{ .Values.{repository} }}}}@{{{{ .Values.{tag} }}}}")
        }
    };
    Ok(Templated::Inline(expr))
}

#[derive(Debug, PartialEq, Eq)]
enum ImageVersion<'a> {
    Tag(&'a str),
    Digest(&'a str),
}

#[derive(Debug, PartialEq, Eq)]
struct ImageRef<'a> {
    repository: &'a str,
    version: ImageVersion<'a>,
}

impl<'a> ImageRef<'a> {
    /// Split `registry:port/repo:tag` or `repo@sha256:...`; a missing tag
    /// means `latest`
    fn parse(image: &'a str) -> Self {
        if let Some((name, digest)) = image.split_once('@') {
            return Self {
                repository: Self::parse(name).repository,
                version: ImageVersion::Digest(digest),
            };
        }

        let name_start = image.rfind('/').map_or(0, |i| i + 1);
        match image[name_start..].rfind(':') {
            Some(i) => Self {
                repository: &image[..name_start + i],
                version: ImageVersion::Tag(&image[name_start + i + 1..]),
            },
            None => Self {
                repository: image,
                version: ImageVersion::Tag("latest"),
            },
        }
    }
}
