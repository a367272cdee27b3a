//! Export rendering for scan snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::app::scan::ScanResult;
use crate::infra::config::Config;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Comma-separated values for translator handoff.
    Csv,
    /// Markdown report with a layer table.
    Markdown,
}

impl ExportFormat {
    /// Return a stable identifier for templates and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "layers_csv",
            ExportFormat::Markdown => "layers_report",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" | "report" => Ok(ExportFormat::Markdown),
            other => Err(ExportFormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Error returned when parsing an [`ExportFormat`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ExportFormatParseError {
    #[error("unknown export format '{0}'")]
    UnknownFormat(String),
}

/// Runtime options controlling export behavior.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub template: String,
    pub include_bound: bool,
    pub include_hidden: bool,
    pub output_path: Option<PathBuf>,
}

impl ExportOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self::resolve(config, None)
    }

    /// Build options from configuration, letting the caller pin the format.
    /// An explicitly configured template wins over the format's built-in.
    pub fn resolve(config: &Config, format: Option<ExportFormat>) -> Self {
        let format = format.unwrap_or_else(|| {
            <ExportFormat as FromStr>::from_str(&config.defaults.export_format)
                .unwrap_or(ExportFormat::Csv)
        });
        let template = config
            .export
            .template()
            .map(str::to_owned)
            .unwrap_or_else(|| format.default_template().to_owned());
        Self {
            format,
            template,
            include_bound: config.export.include_bound(),
            include_hidden: config.export.include_hidden(),
            output_path: None,
        }
    }
}

/// Result of an export operation.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub rendered: String,
    pub output_path: Option<PathBuf>,
    /// How many records made it through the include filters.
    pub records: usize,
}

/// Renders scan snapshots through built-in or filesystem templates.
pub struct Exporter {
    env: Environment<'static>,
}

impl Exporter {
    /// Create a new exporter with built-in templates loaded.
    pub fn new() -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render the snapshot into a string using the supplied options.
    pub fn render(&self, scan: &ScanResult, options: &ExportOptions) -> Result<String> {
        let context = build_template_context(scan, options)?;
        self.render_with_template(&context, &options.template)
    }

    /// Render the snapshot and persist it when an output path is set.
    pub fn export(&self, scan: &ScanResult, options: &ExportOptions) -> Result<ExportResult> {
        let context = build_template_context(scan, options)?;
        let rendered = self.render_with_template(&context, &options.template)?;

        if let Some(path) = &options.output_path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create export directory: {}", parent.display())
                })?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write export output to {}", path.display()))?;
        }

        Ok(ExportResult {
            rendered,
            output_path: options.output_path.clone(),
            records: context.records.len(),
        })
    }

    fn render_with_template(
        &self,
        context: &TemplateContext,
        template_name: &str,
    ) -> Result<String> {
        if let Ok(template) = self.env.get_template(template_name) {
            return template
                .render(context)
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        let template_path = Path::new(template_name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).with_context(|| {
                format!(
                    "failed to load template from path {}",
                    template_path.display()
                )
            })?;
            let mut env = Environment::new();
            env.set_trim_blocks(true);
            env.set_lstrip_blocks(true);
            env.add_filter("csv", csv_field);
            env.add_template("external", &source)
                .map_err(|err| anyhow!("invalid template '{}': {err}", template_name))?;
            return env
                .get_template("external")
                .unwrap()
                .render(context)
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        Err(anyhow!(
            "template '{}' not found (built-in or filesystem)",
            template_name
        ))
    }
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("csv", csv_field);
    env.add_template("layers_csv", DEFAULT_CSV_TEMPLATE)
        .map_err(|err| anyhow!("failed to register default csv template: {err}"))?;
    env.add_template("layers_report", DEFAULT_REPORT_TEMPLATE)
        .map_err(|err| anyhow!("failed to register default report template: {err}"))?;
    Ok(env)
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: String) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn build_template_context(scan: &ScanResult, options: &ExportOptions) -> Result<TemplateContext> {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format export timestamp")?;

    let records = scan
        .records
        .iter()
        .filter(|record| options.include_bound || !record.is_bound)
        .filter(|record| options.include_hidden || record.visible)
        .map(|record| TemplateRecord {
            name: record.name.clone(),
            content: record.content.clone(),
            visible: record.visible,
            bound: record.is_bound,
            selected: record.selected,
        })
        .collect();

    Ok(TemplateContext {
        generated_at,
        format: options.format.as_str().to_string(),
        container: scan.container_name.clone(),
        total: scan.records.len(),
        records,
    })
}

#[derive(Serialize)]
struct TemplateContext {
    generated_at: String,
    format: String,
    container: Option<String>,
    total: usize,
    records: Vec<TemplateRecord>,
}

#[derive(Serialize)]
struct TemplateRecord {
    name: String,
    content: String,
    visible: bool,
    bound: bool,
    selected: bool,
}

const DEFAULT_CSV_TEMPLATE: &str = r#"name,content,visible,bound
{% for record in records %}
{{ record.name | csv }},{{ record.content | csv }},{{ record.visible }},{{ record.bound }}
{% endfor %}
"#;

const DEFAULT_REPORT_TEMPLATE: &str = r#"{% if container %}
# Text layers in {{ container }}
{% else %}
# Text layers
{% endif %}

Generated at: {{ generated_at }}

| Layer | Content | Visible | Bound |
| --- | --- | --- | --- |
{% for record in records %}
| {{ record.name }} | {{ record.content }} | {{ record.visible }} | {{ record.bound }} |
{% endfor %}

{{ records | length }} of {{ total }} text layer(s) exported.
"#;
