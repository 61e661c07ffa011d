//! Ingress processor
//!
//! The ingress class and hosts become quoted values; backend service names
//! and TLS secret names become templated references. A TLS binding may name
//! at most one host.

use chartify_core::{AppMetadata, Manifest, Template, Templated};
use k8s_openapi::api::networking::v1::Ingress;

use crate::error::{ConvertError, Result};
use crate::fields;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

pub struct IngressProcessor;

impl Processor for IngressProcessor {
    fn name(&self) -> &'static str {
        "ingress"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("networking.k8s.io", "v1", "Ingress")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let ingress: Ingress = decode(obj, "Ingress")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(spec) = &ingress.spec else {
            return builder.finish();
        };
        let mut value = encode(obj, spec)?;

        if let Some(class) = spec.ingress_class_name.as_deref() {
            let path = builder.record("", "class", class)?;
            fields::set(&mut value, "/ingressClassName", &Templated::values_pipeline(&path, "quote"));
        }

        let mut host_fields = Vec::new();
        for (i, rule) in spec.rules.iter().flatten().enumerate() {
            if let Some(host) = rule.host.as_deref() {
                host_fields.push((format!("/rules/{i}/host"), host));
            }
        }
        for (i, tls) in spec.tls.iter().flatten().enumerate() {
            let hosts = tls.hosts.as_deref().unwrap_or_default();
            if hosts.len() > 1 {
                return Err(ConvertError::ambiguous(
                    obj,
                    format!("spec.tls[{i}].hosts"),
                    format!(
                        "TLS binding lists {} hosts ({}); only one host per binding can be expressed as a value",
                        hosts.len(),
                        hosts.join(", ")
                    ),
                ));
            }
            if let Some(host) = hosts.first() {
                host_fields.push((format!("/tls/{i}/hosts/0"), host.as_str()));
            }
        }

        // One distinct host is `host`; several become the `hosts` list
        let mut distinct: Vec<&str> = Vec::new();
        for (_, host) in &host_fields {
            if !distinct.contains(host) {
                distinct.push(*host);
            }
        }
        let expressions: Vec<Templated> = match distinct.as_slice() {
            [] => Vec::new(),
            [host] => {
                let path = builder.record("", "host", *host)?;
                vec![Templated::values_pipeline(&path, "quote")]
            }
            hosts => {
                let path = builder.record("", "hosts", hosts.to_vec())?;
                (0..hosts.len())
                    .map(|i| Templated::Inline(format!("{{{{ index .Values.{path} {i} | quote }}}}")))
                    .collect()
            }
        };
        for (pointer, host) in &host_fields {
            if let Some(i) = distinct.iter().position(|d| d == host) {
                fields::set(&mut value, pointer, &expressions[i]);
            }
        }

        fields::reference(app, &mut value, "/defaultBackend/service/name");
        for i in 0..fields::len_at(&value, "/rules") {
            let paths = format!("/rules/{i}/http/paths");
            for j in 0..fields::len_at(&value, &paths) {
                fields::reference(app, &mut value, &format!("{paths}/{j}/backend/service/name"));
            }
        }
        for i in 0..fields::len_at(&value, "/tls") {
            fields::reference(app, &mut value, &format!("/tls/{i}/secretName"));
        }

        builder.field("spec", value);
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::ChartConfig;
    use serde_json::json;

    fn manifest(content: &str) -> Manifest {
        Manifest::parse_documents(content).unwrap().remove(0)
    }

    const INGRESS: &str = r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
  annotations:
    nginx.ingress.kubernetes.io/rewrite-target: /
spec:
  ingressClassName: nginx
  tls:
    - hosts:
        - example.com
      secretName: app-tls
  rules:
    - host: example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: my-svc
                port:
                  number: 80
"#;

    #[test]
    fn test_backend_and_values() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let template = IngressProcessor.template(&app, &manifest(INGRESS)).unwrap();

        assert_eq!(template.filename, "web-ingress.yaml");
        assert!(
            template
                .content
                .contains("name: {{ include \"app.fullname\" . }}-my-svc\n"),
            "{}",
            template.content
        );
        assert!(template.content.contains("secretName: {{ include \"app.fullname\" . }}-tls\n"));
        assert!(template.content.contains("ingressClassName: {{ .Values.web.class | quote }}\n"));
        assert!(template.content.contains("host: {{ .Values.web.host | quote }}\n"));
        assert!(template.content.contains("- {{ .Values.web.host | quote }}\n"));
        assert!(template.content.contains("nginx.ingress.kubernetes.io/rewrite-target: /"));

        let leaves = template.values.leaves();
        let keys: Vec<&str> = leaves.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["web.class", "web.host"]);
        assert_eq!(template.values.get("web.host"), Some(json!("example.com")));
        assert_eq!(template.values.get("web.class"), Some(json!("nginx")));
    }

    #[test]
    fn test_tls_with_two_hosts_is_ambiguous() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let obj = manifest(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
spec:
  tls:
    - hosts: [a.example.com, b.example.com]
      secretName: app-tls
"#,
        );
        let err = IngressProcessor.template(&app, &obj).unwrap_err();
        match err {
            ConvertError::Ambiguous { field, .. } => assert_eq!(field, "spec.tls[0].hosts"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rules_with_different_hosts_use_a_list() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let obj = manifest(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
spec:
  tls:
    - hosts: [www.example.com]
      secretName: app-tls
  rules:
    - host: api.example.com
    - host: www.example.com
"#,
        );
        let template = IngressProcessor.template(&app, &obj).unwrap();
        let content = &template.content;

        assert_eq!(
            template.values.get("web.hosts"),
            Some(json!(["api.example.com", "www.example.com"]))
        );
        assert!(template.values.get("web.host").is_none());
        assert!(content.contains("- host: {{ index .Values.web.hosts 0 | quote }}\n"), "{content}");
        assert!(content.contains("- host: {{ index .Values.web.hosts 1 | quote }}\n"));
        assert!(content.contains("  - {{ index .Values.web.hosts 1 | quote }}\n"));
    }

    #[test]
    fn test_wildcard_host_renders_valid_yaml() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let obj = manifest(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
spec:
  rules:
    - host: "*.example.com"
"#,
        );
        let template = IngressProcessor.template(&app, &obj).unwrap();
        assert_eq!(template.values.get("web.host"), Some(json!("*.example.com")));

        // What `quote` produces once the value is substituted
        let content = &template.content;
        let spec = &content[content.find("\nspec:").unwrap()..];
        let rendered = spec.replace("{{ .Values.web.host | quote }}", "\"*.example.com\"");
        let parsed: serde_json::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            parsed.pointer("/spec/rules/0/host"),
            Some(&json!("*.example.com"))
        );
    }

    #[test]
    fn test_without_host_or_class() {
        let app = AppMetadata::new(ChartConfig::new("app"));
        let obj = manifest(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
spec:
  defaultBackend:
    service:
      name: app-web
      port:
        number: 8080
"#,
        );
        let template = IngressProcessor.template(&app, &obj).unwrap();
        assert!(template.values.is_empty());
        assert!(!template.content.contains("host"));
        assert!(template.content.contains("name: {{ include \"app.fullname\" . }}-web\n"));
    }

    #[test]
    fn test_applies_only_to_ingress() {
        let svc = manifest("apiVersion: v1\nkind: Service\nmetadata:\n  name: x\n");
        let old = manifest("apiVersion: extensions/v1beta1\nkind: Ingress\nmetadata:\n  name: x\n");
        assert!(!IngressProcessor.applies(&svc));
        assert!(!IngressProcessor.applies(&old));
        assert!(IngressProcessor.applies(&manifest(INGRESS)));
    }
}
