//! # config-gen
//!
//! Generates per-environment configuration from one set of templates and many
//! property "filters". Each filter is one target environment; every template
//! is rendered once per filter into its own output tree.
//!
//! ```text
//! src/config/filters/          src/config/templates/        target/generated-config/
//! ├── dev.properties           ├── app.conf            →    ├── dev/app.conf
//! └── eu/prod.properties       └── bin/start.sh              ├── dev/bin/start.sh
//!                                                            ├── eu/prod/app.conf
//!                                                            └── eu/prod/bin/start.sh
//! ```
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      filters/ + templates/  →  file entries (+ overlay files)
//! 2. Resolve   each filter            →  ordered property mapping
//! 3. Render    filters × templates    →  output tree + missing property report
//! ```
//!
//! Every filter is expected to define every key any filter defines. A key
//! that a template uses but some filter lacks is reported for that filter once
//! the whole matrix has been rendered, so one run lists every gap.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Options, TOML loading and layering, validation, stock config |
//! | [`scan`] | Recursive file discovery with ignore prefixes and overlay lookup |
//! | [`properties`] | `key=value` property file parsing and text encodings |
//! | [`filter`] | Merging a filter and its overlays into one mapping |
//! | [`substitute`] | Placeholder substitution and missing-value detection |
//! | [`layout`] | Output path for a (template, filter) pair |
//! | [`report`] | Missing properties aggregated over a run |
//! | [`generate`] | The full run: clean, scan, resolve, render, write, report |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Full Regeneration
//!
//! The output directory is deleted and recreated on every run. Generated
//! configuration is cheap to produce, and a clean tree guarantees no file from
//! a removed template or filter survives into a deployment.
//!
//! ## Overlays Instead of Includes
//!
//! Shared values live in property files at the same relative path under extra
//! filter roots. The environment's own file always wins, so a module can
//! override any common value without a templating language.
//!
//! ## Sentinel Values for Missing Keys
//!
//! Missing keys are substituted with a marker such as
//! `<<<<<<< db.password >>>>>>>` instead of being left as placeholders. The
//! marker is easy to spot in generated files and lets one regex pass recover
//! exactly which keys a template needed.

pub mod config;
pub mod filter;
pub mod generate;
pub mod layout;
pub mod output;
pub mod properties;
pub mod report;
pub mod scan;
pub mod substitute;

#[cfg(test)]
pub(crate) mod test_helpers;
