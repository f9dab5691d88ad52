//! Generation run: every filter × every template.
//!
//! ## Steps
//!
//! 1. Delete and recreate the output base directory.
//! 2. Scan filters (attaching overlay files) and templates.
//! 3. Resolve every filter once and collect the union of all keys. A key in
//!    the union that a filter lacks is a missing property for that filter.
//! 4. For each filter, render every template, write it to its planned path and
//!    merge the missing keys into the run-wide report.
//! 5. Log the report; fail with [`GenerateError::MissingProperties`] when the
//!    fail-on-missing policy is enabled.
//!
//! Unreadable or malformed inputs and write failures abort immediately. Missing
//! properties are collected across the whole matrix first so a single run
//! lists every gap in every filter.
//!
//! [`check`] runs steps 2–5 without touching the output directory.

use crate::config::{ConfigError, GeneratorConfig};
use crate::filter::{self, PropertyMapping};
use crate::layout;
use crate::properties::{self, Encoding, PropertiesError};
use crate::report::MissingPropertyReport;
use crate::scan::{self, FileEntry, IgnoreList, ScanError, to_slash};
use crate::substitute::{Sentinel, Substitutor};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Properties(#[from] PropertiesError),
    #[error("Cannot read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        source: PropertiesError,
    },
    #[error("Cannot write {path}: {source}")]
    OutputWrite { path: PathBuf, source: io::Error },
    #[error("{path} cannot be written as {encoding}")]
    OutputEncoding { path: PathBuf, encoding: Encoding },
    #[error("Filters {first} and {second} both generate {path}")]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },
    #[error("{0}")]
    MissingProperties(MissingPropertyReport),
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Filter path relative to the filter root.
    pub filter: String,
    /// Template path relative to the template root.
    pub template: String,
    pub output: PathBuf,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub filters: Vec<FileEntry>,
    pub templates: Vec<FileEntry>,
    pub generated: Vec<GeneratedFile>,
    /// Missing properties; non-empty only when the fail policy is disabled.
    pub missing: MissingPropertyReport,
}

/// Clear the output directory and generate every (filter, template) pair.
pub fn run(config: &GeneratorConfig) -> Result<GenerationSummary, GenerateError> {
    config.validate()?;
    config.log_summary();
    clear_output_directory(&config.output_base_path)?;
    execute(config, true)
}

/// Render every pair in memory and report missing properties without
/// writing anything.
pub fn check(config: &GeneratorConfig) -> Result<GenerationSummary, GenerateError> {
    config.validate()?;
    config.log_summary();
    execute(config, false)
}

/// The missing property report a finished run produced: the summary's on
/// success, the failing report under the fail policy, and none when the run
/// aborted for any other reason.
pub fn reported_missing(
    result: &Result<GenerationSummary, GenerateError>,
) -> Option<&MissingPropertyReport> {
    match result {
        Ok(summary) => Some(&summary.missing),
        Err(GenerateError::MissingProperties(report)) => Some(report),
        Err(_) => None,
    }
}

/// Inputs of one run, discarded when it ends.
struct GenerationRun<'c> {
    config: &'c GeneratorConfig,
    encoding: Encoding,
    filters: Vec<FileEntry>,
    templates: Vec<FileEntry>,
    mappings: Vec<PropertyMapping>,
    report: MissingPropertyReport,
    /// Output path → filter that produced it.
    planned: HashMap<PathBuf, String>,
}

fn execute(config: &GeneratorConfig, write: bool) -> Result<GenerationSummary, GenerateError> {
    let mut generation = GenerationRun::prepare(config)?;
    let generated = generation.render_all(write)?;
    let GenerationRun {
        filters,
        templates,
        report,
        ..
    } = generation;

    if !report.is_empty() {
        if config.fail_on_missing_property {
            error!("{report}");
            return Err(GenerateError::MissingProperties(report));
        }
        warn!("{report}");
    }

    Ok(GenerationSummary {
        filters,
        templates,
        generated,
        missing: report,
    })
}

impl<'c> GenerationRun<'c> {
    fn prepare(config: &'c GeneratorConfig) -> Result<Self, GenerateError> {
        let encoding = config.resolved_encoding();

        let filters = scan::scan_filters(
            &config.filters_base_path,
            &IgnoreList::new(&config.filters_to_ignore),
            &config.external_filter_base_paths,
        )?;
        debug!("Read {} filters", filters.len());
        let templates = scan::scan(
            &config.templates_base_path,
            &IgnoreList::new(&config.templates_to_ignore),
        )?;
        debug!("Read {} templates", templates.len());

        let mappings = filters
            .iter()
            .map(|f| filter::resolve(f, encoding, config.source_property_name()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            encoding,
            filters,
            templates,
            mappings,
            report: MissingPropertyReport::new(),
            planned: HashMap::new(),
        })
    }

    fn render_all(&mut self, write: bool) -> Result<Vec<GeneratedFile>, GenerateError> {
        let expected = filter::all_property_keys(&self.mappings);
        debug!("Filter property names: {:?}", expected);

        let syntax = self.config.placeholder_syntax();
        let sentinel = Sentinel::default();
        let template_texts = self
            .templates
            .iter()
            .map(|t| {
                properties::read_text(&t.path, self.encoding).map_err(|source| {
                    GenerateError::TemplateRead {
                        path: t.path.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut generated = Vec::with_capacity(self.filters.len() * self.templates.len());
        for (filter, mapping) in self.filters.iter().zip(&self.mappings) {
            let substitutor = Substitutor::new(mapping, &expected, &syntax, &sentinel);
            let filter_id = to_slash(&filter.path);

            for (template, text) in self.templates.iter().zip(&template_texts) {
                let output = layout::plan(template, filter, &self.config.output_base_path);
                if let Some(first) = self.planned.insert(output.clone(), filter.relative_path()) {
                    return Err(GenerateError::OutputCollision {
                        path: output,
                        first,
                        second: filter.relative_path(),
                    });
                }
                debug!(
                    "Applying filter {} to template {}",
                    filter.relative_path(),
                    template.relative_path()
                );

                let rendered = substitutor.render(text);
                for key in &rendered.missing {
                    info!("{filter_id} : {key}");
                }
                self.report.merge(&filter_id, rendered.missing);

                if write {
                    self.log_created(&output);
                    write_output(&output, &rendered.text, self.encoding)?;
                }
                generated.push(GeneratedFile {
                    filter: filter.relative_path(),
                    template: template.relative_path(),
                    output,
                });
            }
        }
        Ok(generated)
    }

    fn log_created(&self, output: &Path) {
        if self.config.log_output {
            let shown = output
                .strip_prefix(&self.config.output_base_path)
                .unwrap_or(output);
            info!("Creating : {}", to_slash(shown));
        } else {
            debug!("Creating : {}", to_slash(output));
        }
    }
}

/// Delete the output directory if present and create it empty.
fn clear_output_directory(output_base: &Path) -> Result<(), GenerateError> {
    let write_err = |source| GenerateError::OutputWrite {
        path: output_base.to_path_buf(),
        source,
    };
    if output_base.exists() {
        debug!("Deleting : {}", output_base.display());
        fs::remove_dir_all(output_base).map_err(write_err)?;
    }
    fs::create_dir_all(output_base).map_err(write_err)
}

fn write_output(path: &Path, text: &str, encoding: Encoding) -> Result<(), GenerateError> {
    let bytes = encoding
        .encode(text)
        .ok_or_else(|| GenerateError::OutputEncoding {
            path: path.to_path_buf(),
            encoding,
        })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GenerateError::OutputWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| GenerateError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}
