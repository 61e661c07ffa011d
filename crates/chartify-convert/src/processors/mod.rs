//! Processors for the supported resource kinds

pub mod configmap;
pub mod generic;
pub mod ingress;
pub mod job;
pub mod pvc;
pub mod rbac;
pub mod secret;
pub mod service;
pub mod service_account;
pub mod workload;

pub use configmap::ConfigMapProcessor;
pub use generic::GenericProcessor;
pub use ingress::IngressProcessor;
pub use job::{CronJobProcessor, JobProcessor};
pub use pvc::PvcProcessor;
pub use rbac::{BindingProcessor, RoleProcessor};
pub use secret::SecretProcessor;
pub use service::ServiceProcessor;
pub use service_account::ServiceAccountProcessor;
pub use workload::WorkloadProcessor;
