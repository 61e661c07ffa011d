//! Jobs and CronJobs

use chartify_core::{AppMetadata, Manifest, Template, Templated};
use k8s_openapi::api::batch::v1::{CronJob, Job};

use crate::error::Result;
use crate::fields;
use crate::pod;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

pub struct JobProcessor;

impl Processor for JobProcessor {
    fn name(&self) -> &'static str {
        "job"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("batch", "v1", "Job")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let job: Job = decode(obj, "Job")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(spec) = &job.spec else {
            return builder.finish();
        };
        let mut value = encode(obj, spec)?;

        if let Some(backoff_limit) = spec.backoff_limit {
            let expr = builder.add("", "backoffLimit", backoff_limit)?;
            fields::set(&mut value, "/backoffLimit", &expr);
        }

        let template = pod::pod_template(&mut builder, &spec.template)?;
        if let Some(field) = value.pointer_mut("/template") {
            *field = template;
        }

        builder.field("spec", value);
        builder.finish()
    }
}

/// The schedule is quoted on render since cron syntax starts with `*`
/// more often than not
pub struct CronJobProcessor;

impl Processor for CronJobProcessor {
    fn name(&self) -> &'static str {
        "cron"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("batch", "v1", "CronJob")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let cron: CronJob = decode(obj, "CronJob")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        let Some(spec) = &cron.spec else {
            return builder.finish();
        };
        let mut value = encode(obj, spec)?;

        let schedule = builder.record("", "schedule", spec.schedule.as_str())?;
        fields::set(
            &mut value,
            "/schedule",
            &Templated::values_pipeline(&schedule, "quote"),
        );

        if let Some(suspend) = spec.suspend {
            let expr = builder.add("", "suspend", suspend)?;
            fields::set(&mut value, "/suspend", &expr);
        }

        if let Some(job_spec) = &spec.job_template.spec {
            let template = pod::pod_template(&mut builder, &job_spec.template)?;
            if let Some(field) = value.pointer_mut("/jobTemplate/spec/template") {
                *field = template;
            }
        }

        builder.field("spec", value);
        builder.finish()
    }
}
