//! Generate command - build a chart from rendered manifests

use chartify_convert::{DispatchOptions, DispatchReport, Dispatcher};
use chartify_core::{AppMetadata, ChartConfig};
use console::style;
use std::path::{Path, PathBuf};

use crate::chart::{ChartWriter, chart_files};
use crate::error::{CliError, Result};
use crate::input;

/// Everything `chartify generate` was asked to do
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub chart_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub name: Option<String>,
    pub name_override: Option<String>,
    pub app_version: Option<String>,
    pub annotations: Vec<String>,
    pub force: bool,
    pub generic: bool,
    pub fail_fast: bool,
    pub dry_run: bool,
}

/// Parse `KEY=VALUE`
fn parse_annotation(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::input_with_help(
            format!("invalid annotation '{raw}'"),
            "annotations are given as KEY=VALUE",
        )),
    }
}

/// The chart name defaults to the last component of the chart directory
fn chart_name(options: &GenerateOptions) -> Result<String> {
    if let Some(name) = &options.name {
        return Ok(name.clone());
    }
    options
        .chart_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::input_with_help(
                format!("cannot derive a chart name from {}", options.chart_dir.display()),
                "pass --name",
            )
        })
}

fn build_config(options: &GenerateOptions) -> Result<ChartConfig> {
    let mut config = ChartConfig::new(chart_name(options)?);
    if let Some(prefix) = &options.name_override {
        config = config.with_name_override(prefix.clone());
    }
    config.app_version = options.app_version.clone();
    for raw in &options.annotations {
        let (key, value) = parse_annotation(raw)?;
        config = config.with_annotation(key, value);
    }

    config.validate()?;
    Ok(config)
}

pub fn run(options: &GenerateOptions) -> Result<()> {
    let config = build_config(options)?;
    let objects = input::read_manifests(&options.files)?;
    if objects.is_empty() {
        return Err(CliError::input("no Kubernetes objects found in the input"));
    }

    let app = AppMetadata::new(config);
    let dispatcher = Dispatcher::new(super::registry(options.generic)).with_options(DispatchOptions {
        fail_fast: options.fail_fast,
    });
    let report = dispatcher.dispatch(&app, &objects)?;
    let files = chart_files(&app, &report)?;

    if options.dry_run {
        for (path, content) in &files {
            println!("---");
            println!("# Source: {}", path.display());
            print!("{}", content);
        }
    } else {
        let writer = ChartWriter::new(&options.chart_dir, options.force);
        writer.write(&files)?;
    }

    print_summary(&options.chart_dir, &report, options.dry_run);

    if report.has_errors() {
        return Err(CliError::Incomplete {
            failed: report.errors.len(),
        });
    }

    Ok(())
}

fn print_summary(chart_dir: &Path, report: &DispatchReport, dry_run: bool) {
    // Summary goes to stderr so --dry-run output stays pipeable
    let verb = if dry_run { "Rendered" } else { "Generated" };
    eprintln!(
        "{} {} template(s) in {}",
        style(verb).green().bold(),
        report.templates.len(),
        chart_dir.display()
    );
    for template in &report.templates {
        eprintln!("  {} templates/{}", style("✓").green(), template.filename);
    }

    if !report.unhandled.is_empty() {
        eprintln!();
        eprintln!(
            "{} {} object(s) not converted",
            style("Skipped").yellow().bold(),
            report.unhandled.len()
        );
        for object in &report.unhandled {
            eprintln!("  {} {}", style("-").yellow(), object);
        }
    }

    if !report.errors.is_empty() {
        eprintln!();
        eprintln!(
            "{} {} object(s)",
            style("Failed").red().bold(),
            report.errors.len()
        );
        for failure in &report.errors {
            eprintln!(
                "  {} {} ({}): {}",
                style("✗").red(),
                failure.object,
                failure.processor,
                failure.error
            );
        }
    }
}
