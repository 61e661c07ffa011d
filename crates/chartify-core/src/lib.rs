//! Chartify Core - foundational types for turning rendered manifests into a chart
//!
//! This crate provides the shared services every resource processor uses:
//! - `Manifest`: a decoded Kubernetes object and its identity
//! - `NameRegistry`: stable chart names and templated references
//! - `Values`: the conflict-checked values document
//! - `Templated`: template expressions as a distinct field type
//! - `yaml`: rendering of template bodies

pub mod config;
pub mod error;
pub mod gvk;
pub mod manifest;
pub mod names;
pub mod template;
pub mod values;
pub mod yaml;

pub use config::{AppMetadata, ChartConfig};
pub use error::{CoreError, Result};
pub use gvk::{Gvk, ObjectRef};
pub use manifest::Manifest;
pub use names::{NameRegistry, lower_camel};
pub use template::{Template, Templated};
pub use values::Values;
