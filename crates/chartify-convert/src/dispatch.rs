//! Processor registry and dispatcher
//!
//! Every object is offered to the registered processors in order until one
//! claims it. Unclaimed objects are reported, per-object failures are
//! collected, and only a values conflict between two objects stops the run.

use chartify_core::{AppMetadata, Manifest, ObjectRef, Template, Values};
use indexmap::IndexMap;

use crate::error::{ConvertError, Result};
use crate::processor::Processor;
use crate::processors::{
    BindingProcessor, ConfigMapProcessor, CronJobProcessor, GenericProcessor, IngressProcessor,
    JobProcessor, PvcProcessor, RoleProcessor, SecretProcessor, ServiceAccountProcessor,
    ServiceProcessor, WorkloadProcessor,
};

/// Ordered set of processors
pub struct Registry {
    processors: Vec<Box<dyn Processor>>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// All built-in processors, most specific first
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(IngressProcessor)
            .register(ServiceProcessor)
            .register(WorkloadProcessor)
            .register(JobProcessor)
            .register(CronJobProcessor)
            .register(ConfigMapProcessor)
            .register(SecretProcessor)
            .register(PvcProcessor)
            .register(ServiceAccountProcessor)
            .register(RoleProcessor)
            .register(BindingProcessor);
        registry
    }

    /// Append the catch-all processor
    pub fn with_generic(mut self) -> Self {
        self.register(GenericProcessor);
        self
    }

    pub fn register(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Names of every processor whose `applies` holds for `obj`
    pub fn claimants(&self, obj: &Manifest) -> Vec<&'static str> {
        self.processors
            .iter()
            .filter(|p| p.applies(obj))
            .map(|p| p.name())
            .collect()
    }

    /// The processor that would claim `obj`
    pub fn find(&self, obj: &Manifest) -> Option<&dyn Processor> {
        self.processors
            .iter()
            .find(|p| p.applies(obj))
            .map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Options for the dispatcher
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Stop at the first object a processor claimed but could not convert
    pub fail_fast: bool,
}

/// A claimed object that failed to convert
#[derive(Debug)]
pub struct ObjectError {
    pub object: ObjectRef,
    /// Processor that claimed the object
    pub processor: &'static str,
    pub error: ConvertError,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// One template per successfully claimed object, in input order
    pub templates: Vec<Template>,
    /// Objects no processor claimed
    pub unhandled: Vec<ObjectRef>,
    pub errors: Vec<ObjectError>,
    /// Values of every template, merged
    pub values: Values,
}

impl DispatchReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs a registry over a set of objects
pub struct Dispatcher {
    registry: Registry,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            options: DispatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Convert `objects`.
    ///
    /// Returns `Err` only for a values conflict between objects; every other
    /// failure is recorded in the report.
    pub fn dispatch(&self, app: &AppMetadata, objects: &[Manifest]) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();
        let mut filenames: IndexMap<String, ObjectRef> = IndexMap::new();

        for obj in objects {
            let object = obj.object_ref();
            let Some((processor, outcome)) = self.claim(app, obj) else {
                tracing::warn!("no processor for {}", object);
                report.unhandled.push(object);
                continue;
            };

            let template = match outcome.and_then(|template| {
                check_filename(&filenames, &template)?;
                Ok(template)
            }) {
                Ok(template) => template,
                Err(error) => {
                    tracing::warn!("{} failed: {}", processor, error);
                    report.errors.push(ObjectError {
                        object,
                        processor,
                        error,
                    });
                    if self.options.fail_fast {
                        break;
                    }
                    continue;
                }
            };

            report
                .values
                .merge(&template.values)
                .map_err(|source| ConvertError::ValuesConflict {
                    object: object.clone(),
                    source,
                })?;

            tracing::debug!("{} claimed {} as {}", processor, object, template.filename);
            filenames.insert(template.filename.clone(), object);
            report.templates.push(template);
        }

        Ok(report)
    }

    /// First claim for `obj`: the claiming processor and its outcome
    fn claim(&self, app: &AppMetadata, obj: &Manifest) -> Option<(&'static str, Result<Template>)> {
        for processor in &self.registry.processors {
            match processor.process(app, obj) {
                Ok(None) => continue,
                Ok(Some(template)) => return Some((processor.name(), Ok(template))),
                Err(error) => return Some((processor.name(), Err(error))),
            }
        }
        None
    }
}

fn check_filename(filenames: &IndexMap<String, ObjectRef>, template: &Template) -> Result<()> {
    match filenames.get(&template.filename) {
        Some(previous) => Err(ConvertError::DuplicateTemplate {
            object: template.object.clone(),
            filename: template.filename.clone(),
            previous: previous.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::ChartConfig;
    use serde_json::json;

    fn parse(content: &str) -> Vec<Manifest> {
        Manifest::parse_documents(content).unwrap()
    }

    fn app() -> AppMetadata {
        AppMetadata::new(ChartConfig::new("app"))
    }

    const MIXED: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: my-svc
spec:
  type: ClusterIP
  selector:
    app: web
  ports:
    - port: 80
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-web
spec:
  ingressClassName: nginx
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
---
apiVersion: v1
kind: Namespace
metadata:
  name: app
---
apiVersion: batch/v1
kind: CronJob
metadata:
  name: app-report
spec:
  schedule: "0 3 * * *"
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: Never
          containers:
            - name: report
              image: report:1.0
"#;

    #[test]
    fn test_dispatch_mixed_objects() {
        let app = app();
        let report = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &parse(MIXED))
            .unwrap();

        let files: Vec<&str> = report.templates.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(
            files,
            vec!["my-svc-service.yaml", "web-ingress.yaml", "report-cronjob.yaml"]
        );
        assert_eq!(report.unhandled.len(), 1);
        assert_eq!(report.unhandled[0].gvk.kind, "Namespace");
        assert!(!report.has_errors());
    }

    #[test]
    fn test_ingress_backend_matches_service_name() {
        let app = app();
        let report = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &parse(MIXED))
            .unwrap();

        let ingress = &report.templates[1].content;
        let service = &report.templates[0].content;
        let reference = "{{ include \"app.fullname\" . }}-my-svc";
        assert!(ingress.contains(&format!("name: {reference}\n")));
        assert!(service.contains(&format!("  name: {reference}\n")));

        let hosts: Vec<_> = report
            .values
            .leaves()
            .into_iter()
            .filter(|(path, _)| path.starts_with("web."))
            .map(|(path, _)| path)
            .collect();
        assert_eq!(hosts, vec!["web.class", "web.host"]);
        assert_eq!(report.values.get("web.host"), Some(json!("example.com")));
    }

    #[test]
    fn test_ambiguous_ingress_does_not_stop_run() {
        let mut objects = parse(MIXED);
        objects.extend(parse(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: app-multi
spec:
  tls:
    - hosts: [a.example.com, b.example.com]
"#,
        ));
        objects.extend(parse("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app-cm\n"));

        let app = app();
        let report = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &objects)
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].processor, "ingress");
        assert_eq!(report.errors[0].object.name, "app-multi");
        assert!(matches!(report.errors[0].error, ConvertError::Ambiguous { .. }));
        assert!(report.templates.iter().all(|t| t.object.name != "app-multi"));
        assert!(report.templates.iter().any(|t| t.filename == "cm-configmap.yaml"));
        assert!(report.values.get("multi").is_none());
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let objects = parse(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: broken
spec:
  replicas: lots
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: app-cm
"#,
        );
        let app = app();
        let report = Dispatcher::new(Registry::with_defaults())
            .with_options(DispatchOptions { fail_fast: true })
            .dispatch(&app, &objects)
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0].error, ConvertError::Decode { .. }));
        assert!(report.templates.is_empty());
    }

    #[test]
    fn test_values_conflict_aborts_run() {
        // same trimmed name, same values key, different replica counts
        let objects = parse(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app-web
spec:
  replicas: 2
  selector: {}
  template:
    spec:
      containers: []
---
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: web
spec:
  replicas: 3
  selector: {}
  template:
    spec:
      containers: []
"#,
        );
        let app = app();
        let err = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &objects)
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.object().name, "web");
    }

    #[test]
    fn test_duplicate_filename_reported() {
        let objects = parse(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app-cm\n  namespace: a\n---\n\
             apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app-cm\n  namespace: b\n",
        );
        let app = app();
        let report = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &objects)
            .unwrap();
        assert_eq!(report.templates.len(), 1);
        assert!(matches!(
            report.errors[0].error,
            ConvertError::DuplicateTemplate { .. }
        ));
    }

    #[test]
    fn test_single_claim_invariant() {
        let registry = Registry::with_defaults();
        let objects = parse(MIXED);
        for obj in &objects {
            assert!(registry.claimants(obj).len() <= 1, "{}", obj.object_ref());
        }

        let generic = Registry::with_defaults().with_generic();
        assert_eq!(generic.find(&objects[2]).map(|p| p.name()), Some("generic"));
        assert_eq!(generic.find(&objects[0]).map(|p| p.name()), Some("service"));
    }

    #[test]
    fn test_values_deterministic() {
        let run = || {
            let app = app();
            Dispatcher::new(Registry::with_defaults())
                .dispatch(&app, &parse(MIXED))
                .unwrap()
                .values
                .to_yaml()
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_values_independent_of_registry_order() {
        let mut reversed = Registry::new();
        reversed
            .register(BindingProcessor)
            .register(RoleProcessor)
            .register(ServiceAccountProcessor)
            .register(PvcProcessor)
            .register(SecretProcessor)
            .register(ConfigMapProcessor)
            .register(CronJobProcessor)
            .register(JobProcessor)
            .register(WorkloadProcessor)
            .register(ServiceProcessor)
            .register(IngressProcessor);

        let app = app();
        let objects = parse(MIXED);
        let expected = Dispatcher::new(Registry::with_defaults())
            .dispatch(&app, &objects)
            .unwrap();
        let actual = Dispatcher::new(reversed).dispatch(&app, &objects).unwrap();

        assert_eq!(actual.values.to_yaml().unwrap(), expected.values.to_yaml().unwrap());
        let files = |report: &DispatchReport| {
            report
                .templates
                .iter()
                .map(|t| (t.filename.clone(), t.content.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(files(&actual), files(&expected));
    }

    #[test]
    fn test_empty_registry_reports_everything_unhandled() {
        let app = app();
        let registry = Registry::new();
        assert!(registry.is_empty());
        let report = Dispatcher::new(registry).dispatch(&app, &parse(MIXED)).unwrap();
        assert_eq!(report.unhandled.len(), 4);
        assert!(report.templates.is_empty());
        assert!(report.values.is_empty());
    }
}
