//! RBAC roles and bindings
//!
//! Rules stay literal. Bindings point at the chart's own role and service
//! accounts, so `roleRef.name` and service account subjects are templated.
//! Built-in cluster roles keep their literal names.

use chartify_core::{AppMetadata, Manifest, Template, Templated};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, Subject};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::fields;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

const BUILTIN_CLUSTER_ROLES: &[&str] = &["cluster-admin", "admin", "edit", "view"];

fn is_builtin_role(role: &RoleRef) -> bool {
    role.kind == "ClusterRole"
        && (BUILTIN_CLUSTER_ROLES.contains(&role.name.as_str()) || role.name.starts_with("system:"))
}

pub struct RoleProcessor;

impl Processor for RoleProcessor {
    fn name(&self) -> &'static str {
        "role"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        let gvk = obj.gvk();
        gvk.group == RBAC_GROUP && gvk.version == "v1" && matches!(gvk.kind.as_str(), "Role" | "ClusterRole")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let (rules, aggregation) = if obj.gvk().kind == "Role" {
            let role: Role = decode(obj, "Role")?;
            (encode(obj, &role.rules)?, JsonValue::Null)
        } else {
            let role: ClusterRole = decode(obj, "ClusterRole")?;
            (encode(obj, &role.rules)?, encode(obj, &role.aggregation_rule)?)
        };

        let mut builder = TemplateBuilder::new(app, obj)?;
        builder.field("aggregationRule", aggregation);
        builder.field("rules", rules);
        builder.finish()
    }
}

pub struct BindingProcessor;

impl Processor for BindingProcessor {
    fn name(&self) -> &'static str {
        "role_binding"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        let gvk = obj.gvk();
        gvk.group == RBAC_GROUP
            && gvk.version == "v1"
            && matches!(gvk.kind.as_str(), "RoleBinding" | "ClusterRoleBinding")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let (role_ref, subjects): (RoleRef, Option<Vec<Subject>>) = if obj.gvk().kind == "RoleBinding" {
            let binding: RoleBinding = decode(obj, "RoleBinding")?;
            (binding.role_ref, binding.subjects)
        } else {
            let binding: ClusterRoleBinding = decode(obj, "ClusterRoleBinding")?;
            (binding.role_ref, binding.subjects)
        };

        let mut builder = TemplateBuilder::new(app, obj)?;

        let mut role_value = encode(obj, &role_ref)?;
        if !is_builtin_role(&role_ref) {
            fields::reference(app, &mut role_value, "/name");
        }

        let mut subjects_value = encode(obj, &subjects)?;
        for (i, subject) in subjects.iter().flatten().enumerate() {
            if subject.kind != "ServiceAccount" {
                continue;
            }
            fields::reference(app, &mut subjects_value, &format!("/{i}/name"));
            fields::set(
                &mut subjects_value,
                &format!("/{i}/namespace"),
                &Templated::Inline("{{ .Release.Namespace }}".to_string()),
            );
        }

        builder.field("roleRef", role_value);
        builder.field("subjects", subjects_value);
        builder.finish()
    }
}
