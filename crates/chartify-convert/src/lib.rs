//! Chartify Convert - rendered Kubernetes manifests to chart templates
//!
//! Each supported kind has a [`Processor`] that decides which fields of an
//! object become template expressions and which stay literal. The
//! [`Dispatcher`] offers every object to the processors of a [`Registry`]
//! in order and gathers the results:
//!
//! | Field kind                          | Becomes                                             |
//! |-------------------------------------|-----------------------------------------------------|
//! | the object's own name               | `{{ include "app.fullname" . }}-web`                |
//! | a name of another object            | the same templated reference as its owner uses      |
//! | tunable scalars (hosts, replicas)   | `{{ .Values.web.replicas }}`                        |
//! | structured settings (ports, limits) | `{{- toYaml .Values.web.ports \| nindent 4 }}`      |
//! | labels and selectors                | literal labels plus the chart's label helpers       |
//!
//! # Example
//!
//! ```no_run
//! use chartify_convert::{Dispatcher, Registry};
//! use chartify_core::{AppMetadata, ChartConfig, Manifest};
//!
//! let objects = Manifest::parse_documents(&std::fs::read_to_string("rendered.yaml")?)?;
//! let app = AppMetadata::new(ChartConfig::new("myapp"));
//!
//! let report = Dispatcher::new(Registry::with_defaults()).dispatch(&app, &objects)?;
//! for template in &report.templates {
//!     println!("templates/{}", template.filename);
//! }
//! for object in &report.unhandled {
//!     println!("not converted: {object}");
//! }
//! print!("{}", report.values.to_yaml()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod dispatch;
pub mod error;
pub mod meta;
pub mod processor;
pub mod processors;

mod fields;
mod pod;

pub use dispatch::{DispatchOptions, DispatchReport, Dispatcher, ObjectError, Registry};
pub use error::{ConvertError, Result};
pub use meta::ObjectHeader;
pub use processor::{Processor, template_filename};
