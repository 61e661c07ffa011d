//! Static chart identity supplied once per run

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::names::NameRegistry;
use crate::template::Templated;

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Chart identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    /// Chart name, also the helper template namespace (`<name>.fullname`)
    pub name: String,

    /// Prefix the source manifests were rendered with, when it is not the
    /// chart name (e.g. a release name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_override: Option<String>,

    /// Chart version (SemVer)
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Annotations added to every generated resource
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, String>,
}

impl ChartConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_override: None,
            version: default_version(),
            app_version: None,
            annotations: IndexMap::new(),
        }
    }

    pub fn with_name_override(mut self, prefix: impl Into<String>) -> Self {
        self.name_override = Some(prefix.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Prefix stripped from plain object names
    pub fn fullname_prefix(&self) -> String {
        let base = self.name_override.as_deref().unwrap_or(&self.name);
        format!("{base}-")
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.len() > 63 || !DNS_LABEL.is_match(&self.name) {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "chart name '{}' must be a lowercase DNS label (a-z, 0-9, '-', at most 63 characters)",
                    self.name
                ),
            });
        }
        if let Some(prefix) = &self.name_override
            && prefix.is_empty()
        {
            return Err(CoreError::InvalidConfig {
                message: "name override must not be empty".to_string(),
            });
        }
        Version::parse(&self.version)?;
        Ok(())
    }
}

/// Chart identity plus the run's name registry, threaded through every
/// processor call
#[derive(Debug)]
pub struct AppMetadata {
    config: ChartConfig,
    names: NameRegistry,
}

impl AppMetadata {
    pub fn new(config: ChartConfig) -> Self {
        let names = NameRegistry::new(config.name.clone(), config.fullname_prefix());
        Self { config, names }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn chart_name(&self) -> &str {
        &self.config.name
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn trimmed_name(&self, plain: &str) -> String {
        self.names.trimmed_name(plain)
    }

    pub fn templated_name(&self, plain: &str) -> String {
        self.names.templated_name(plain)
    }

    pub fn templated_reference(&self, plain: &str) -> Templated {
        self.names.templated_reference(plain)
    }

    /// `include "<chart>.<helper>" .`
    pub fn helper(&self, helper: &str) -> Templated {
        Templated::Include(format!("include \"{}.{}\" .", self.config.name, helper))
    }
}
