//! Writing the generated chart to disk

use chartify_convert::DispatchReport;
use chartify_core::{AppMetadata, ChartConfig};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{CliError, Result};

const HELPERS: &str = r#"{{/*
Expand the name of the chart.
*/}}
{{- define "CHART.name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Create a default fully qualified app name.
We truncate at 63 chars because some Kubernetes name fields are limited to this (by the DNS naming spec).
If release name contains chart name it will be used as a full name.
*/}}
{{- define "CHART.fullname" -}}
{{- if .Values.fullnameOverride }}
{{- .Values.fullnameOverride | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- $name := default .Chart.Name .Values.nameOverride }}
{{- if contains $name .Release.Name }}
{{- .Release.Name | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- printf "%s-%s" .Release.Name $name | trunc 63 | trimSuffix "-" }}
{{- end }}
{{- end }}
{{- end }}

{{/*
Create chart name and version as used by the chart label.
*/}}
{{- define "CHART.chart" -}}
{{- printf "%s-%s" .Chart.Name .Chart.Version | replace "+" "_" | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Common labels
*/}}
{{- define "CHART.labels" -}}
helm.sh/chart: {{ include "CHART.chart" . }}
{{ include "CHART.selectorLabels" . }}
{{- if .Chart.AppVersion }}
app.kubernetes.io/version: {{ .Chart.AppVersion | quote }}
{{- end }}
app.kubernetes.io/managed-by: {{ .Release.Service }}
{{- end }}

{{/*
Selector labels
*/}}
{{- define "CHART.selectorLabels" -}}
app.kubernetes.io/name: {{ include "CHART.name" . }}
app.kubernetes.io/instance: {{ .Release.Name }}
{{- end }}
"#;

/// `_helpers.tpl` with every helper namespaced under the chart name
pub fn helpers(chart_name: &str) -> String {
    HELPERS.replace("CHART.", &format!("{chart_name}."))
}

/// Chart.yaml contents
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartFile<'a> {
    api_version: &'static str,
    name: &'a str,
    description: String,
    #[serde(rename = "type")]
    chart_type: &'static str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_version: Option<&'a str>,
}

impl<'a> ChartFile<'a> {
    fn new(config: &'a ChartConfig) -> Self {
        Self {
            api_version: "v2",
            name: &config.name,
            description: format!("A Helm chart for {}", config.name),
            chart_type: "application",
            version: &config.version,
            app_version: config.app_version.as_deref(),
        }
    }
}

/// Everything that ends up in the chart directory, keyed by relative path
pub fn chart_files(app: &AppMetadata, report: &DispatchReport) -> Result<IndexMap<PathBuf, String>> {
    let config = app.config();
    let mut files = IndexMap::new();

    let chart_yaml = serde_yaml::to_string(&ChartFile::new(config))
        .map_err(|e| CliError::Other { message: format!("failed to serialize Chart.yaml: {e}") })?;
    files.insert(PathBuf::from("Chart.yaml"), chart_yaml);
    let values_yaml = report
        .values
        .to_yaml()
        .map_err(|e| CliError::Other { message: format!("failed to serialize values.yaml: {e}") })?;
    files.insert(PathBuf::from("values.yaml"), values_yaml);

    let templates = PathBuf::from("templates");
    files.insert(templates.join("_helpers.tpl"), helpers(&config.name));
    for template in &report.templates {
        files.insert(templates.join(&template.filename), template.content.clone());
    }

    Ok(files)
}

/// Writes a chart directory
pub struct ChartWriter {
    root: PathBuf,
    force: bool,
}

impl ChartWriter {
    pub fn new(root: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            root: root.into(),
            force,
        }
    }

    /// Fails when the templates directory already holds files and `force`
    /// is off. With `force`, the old templates are removed first so stale
    /// files do not survive.
    fn prepare(&self) -> Result<()> {
        let templates = self.root.join("templates");
        if !templates.is_dir() {
            return Ok(());
        }

        let occupied = std::fs::read_dir(&templates)
            .map_err(|e| CliError::io_at(&templates, e))?
            .next()
            .is_some();
        if !occupied {
            return Ok(());
        }

        if !self.force {
            return Err(CliError::output_with_help(
                format!("{} is not empty", templates.display()),
                "use --force to replace the existing templates",
            ));
        }

        tracing::debug!(dir = %templates.display(), "clearing existing templates");
        std::fs::remove_dir_all(&templates).map_err(|e| CliError::io_at(&templates, e))
    }

    /// Write all files, returning their paths relative to the chart root
    pub fn write(&self, files: &IndexMap<PathBuf, String>) -> Result<Vec<PathBuf>> {
        self.prepare()?;

        let mut written = Vec::with_capacity(files.len());
        for (relative, content) in files {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CliError::io_at(parent, e))?;
            }
            std::fs::write(&path, content).map_err(|e| CliError::io_at(&path, e))?;
            written.push(relative.clone());
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_convert::{Dispatcher, Registry};
    use chartify_core::Manifest;
    use tempfile::TempDir;

    fn report(app: &AppMetadata) -> DispatchReport {
        let objects = Manifest::parse_documents(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: myapp-web\nspec:\n  type: ClusterIP\n",
        )
        .unwrap();
        Dispatcher::new(Registry::with_defaults())
            .dispatch(app, &objects)
            .unwrap()
    }

    #[test]
    fn test_helpers_are_namespaced() {
        let helpers = helpers("shop");
        assert!(helpers.contains(r#"{{- define "shop.fullname" -}}"#));
        assert!(helpers.contains(r#"{{ include "shop.selectorLabels" . }}"#));
        assert!(!helpers.contains("CHART."));
    }

    #[test]
    fn test_chart_files_layout() {
        let mut config = ChartConfig::new("myapp");
        config.app_version = Some("1.2.3".to_string());
        let app = AppMetadata::new(config);
        let files = chart_files(&app, &report(&app)).unwrap();

        let paths: Vec<_> = files.keys().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(paths[0], "Chart.yaml");
        assert_eq!(paths[1], "values.yaml");
        assert!(paths.iter().any(|p| p.ends_with("_helpers.tpl")));
        assert!(paths.iter().any(|p| p.ends_with("web-service.yaml")));

        let chart = &files[&PathBuf::from("Chart.yaml")];
        assert!(chart.contains("apiVersion: v2"));
        assert!(chart.contains("name: myapp"));
        assert!(chart.contains("type: application"));
        assert!(chart.contains("appVersion: 1.2.3"));
    }

    #[test]
    fn test_writer_refuses_non_empty_templates() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("templates/old.yaml");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "kind: Old").unwrap();

        let app = AppMetadata::new(ChartConfig::new("myapp"));
        let files = chart_files(&app, &report(&app)).unwrap();

        let err = ChartWriter::new(temp.path(), false).write(&files).unwrap_err();
        assert!(matches!(err, CliError::Output { .. }));
        assert!(stale.exists());

        ChartWriter::new(temp.path(), true).write(&files).unwrap();
        assert!(!stale.exists());
        assert!(temp.path().join("templates/web-service.yaml").exists());
    }

    #[test]
    fn test_writer_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("charts/myapp");

        let app = AppMetadata::new(ChartConfig::new("myapp"));
        let files = chart_files(&app, &report(&app)).unwrap();
        let written = ChartWriter::new(&root, false).write(&files).unwrap();

        assert_eq!(written.len(), files.len());
        assert!(root.join("values.yaml").exists());
    }
}
