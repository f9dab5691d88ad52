//! Generator configuration.
//!
//! Options come from three layers, later layers overriding earlier ones key by
//! key:
//!
//! ```text
//! stock defaults  →  config-gen.toml (optional)  →  command-line overrides
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! encoding = "UTF-8"                          # UTF-8 or ISO-8859-1
//! templates_base_path = "src/config/templates"
//! filters_base_path = "src/config/filters"
//! external_filter_base_paths = []             # overlay roots, highest priority first
//! output_base_path = "target/generated-config" # deleted and recreated every run
//! log_output = true                           # log each generated file at info level
//! templates_to_ignore = []                    # path prefixes
//! filters_to_ignore = []                      # path prefixes
//! filter_source_property_name = "filter.source" # "" disables
//! property_prefix = "${"
//! property_suffix = "}"
//! fail_on_missing_property = true
//! ```
//!
//! Unknown keys are rejected to catch typos early. Ignore entries are pure
//! path prefixes: they are never checked for existence, so an entry keeps
//! being honoured even when its target is temporarily absent.

use crate::properties::Encoding;
use crate::scan::to_slash;
use crate::substitute::PlaceholderSyntax;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "config-gen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Encoding of filters, templates and generated files. Blank falls back
    /// to UTF-8 with a warning.
    pub encoding: String,
    /// Root of the template tree.
    pub templates_base_path: PathBuf,
    /// Root of the filter tree. Each file is one target environment.
    pub filters_base_path: PathBuf,
    /// Extra roots searched for overlay files at matching relative paths.
    pub external_filter_base_paths: Vec<PathBuf>,
    /// Root of the generated tree. Fully cleared at the start of every run.
    pub output_base_path: PathBuf,
    /// Log every created file at info level instead of debug.
    pub log_output: bool,
    /// Path prefixes excluded from the template scan.
    pub templates_to_ignore: Vec<PathBuf>,
    /// Path prefixes excluded from the filter scan.
    pub filters_to_ignore: Vec<PathBuf>,
    /// Name of the synthetic property listing a filter's source files.
    pub filter_source_property_name: String,
    pub property_prefix: String,
    pub property_suffix: String,
    /// Fail the run when any placeholder had no value in any filter.
    pub fail_on_missing_property: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            templates_base_path: PathBuf::from("src/config/templates"),
            filters_base_path: PathBuf::from("src/config/filters"),
            external_filter_base_paths: Vec::new(),
            output_base_path: PathBuf::from("target/generated-config"),
            log_output: true,
            templates_to_ignore: Vec::new(),
            filters_to_ignore: Vec::new(),
            filter_source_property_name: "filter.source".to_string(),
            property_prefix: "${".to_string(),
            property_suffix: "}".to_string(),
            fail_on_missing_property: true,
        }
    }
}

impl GeneratorConfig {
    /// Validate required values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("templates_base_path", &self.templates_base_path),
            ("filters_base_path", &self.filters_base_path),
            ("output_base_path", &self.output_base_path),
        ];
        for (name, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.property_prefix.is_empty() || self.property_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "property_prefix and property_suffix must not be empty".into(),
            ));
        }
        if !self.encoding.trim().is_empty() && Encoding::from_name(&self.encoding).is_none() {
            return Err(ConfigError::Validation(format!(
                "unsupported encoding '{}' (use UTF-8 or ISO-8859-1)",
                self.encoding
            )));
        }
        Ok(())
    }

    /// Trim path lists, drop blank entries and duplicates, keeping order.
    pub fn normalize(&mut self) {
        dedupe_paths(&mut self.external_filter_base_paths);
        dedupe_paths(&mut self.templates_to_ignore);
        dedupe_paths(&mut self.filters_to_ignore);
    }

    /// The configured encoding. Blank means UTF-8 and is warned about since
    /// the generated output then depends on an implicit choice.
    pub fn resolved_encoding(&self) -> Encoding {
        if self.encoding.trim().is_empty() {
            warn!(
                "File encoding has not been set, using {}, i.e. generated config depends on the default!",
                Encoding::default()
            );
            return Encoding::default();
        }
        Encoding::from_name(&self.encoding).unwrap_or_default()
    }

    pub fn placeholder_syntax(&self) -> PlaceholderSyntax {
        PlaceholderSyntax::new(&self.property_prefix, &self.property_suffix)
    }

    /// The synthetic source property name, if enabled.
    pub fn source_property_name(&self) -> Option<&str> {
        Some(self.filter_source_property_name.trim()).filter(|n| !n.is_empty())
    }

    /// Log every option, one line each.
    pub fn log_summary(&self) {
        debug!("Encoding           : {}", self.encoding);
        debug!("Templates path     : {}", to_slash(&self.templates_base_path));
        debug!("Filters path       : {}", to_slash(&self.filters_base_path));
        debug!("External filters   : {}", join_paths(&self.external_filter_base_paths));
        debug!("Templates ignored  : {}", join_paths(&self.templates_to_ignore));
        debug!("Filters ignored    : {}", join_paths(&self.filters_to_ignore));
        debug!("Source property    : {}", self.filter_source_property_name);
        debug!(
            "Placeholder syntax : {}",
            self.placeholder_syntax().placeholder("name")
        );
        debug!("Fail on missing    : {}", self.fail_on_missing_property);
        let message = format!(
            "Config generation to: {}",
            to_slash(&self.output_base_path)
        );
        if self.log_output {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }
}

fn dedupe_paths(paths: &mut Vec<PathBuf>) {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths.drain(..) {
        let trimmed = PathBuf::from(path.to_string_lossy().trim());
        if trimmed.as_os_str().is_empty() || kept.contains(&trimmed) {
            continue;
        }
        kept.push(trimmed);
    }
    *paths = kept;
}

fn join_paths(paths: &[PathBuf]) -> String {
    let parts: Vec<String> = paths.iter().map(|p| to_slash(p)).collect();
    format!("[{}]", parts.join(", "))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GeneratorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize, normalize and
/// validate.
pub fn resolve_config<I>(base: toml::Value, overlays: I) -> Result<GeneratorConfig, ConfigError>
where
    I: IntoIterator<Item = toml::Value>,
{
    let merged = overlays.into_iter().fold(base, merge_toml);
    let mut config: GeneratorConfig = merged.try_into()?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (if it exists) on top of stock defaults, then apply
/// `overrides`.
pub fn load_config(
    path: &Path,
    overrides: Option<toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    if file.is_none() {
        debug!("No config file at {}, using defaults", path.display());
    }
    resolve_config(base, file.into_iter().chain(overrides))
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# config-gen configuration
# ========================
#
# Every option is optional; the values below are the defaults.
# Relative paths are resolved against the working directory.

# Encoding of filters, templates and generated files: UTF-8 or ISO-8859-1.
encoding = "UTF-8"

# Root of the template tree. Every file below it is rendered once per filter.
templates_base_path = "src/config/templates"

# Root of the filter tree. Every file below it is one target environment,
# written as key=value property lines.
filters_base_path = "src/config/filters"

# Extra filter roots, highest priority first. A file at the same relative path
# as a filter supplies values the filter itself does not define.
external_filter_base_paths = []

# Root of the generated tree: <filter dir>/<filter name>/<template dir>/<template>.
# Deleted and recreated on every run.
output_base_path = "target/generated-config"

# Log every generated file at info level (debug level when false).
log_output = true

# Path prefixes excluded from scanning. A directory entry excludes everything
# below it.
templates_to_ignore = []
filters_to_ignore = []

# Synthetic property listing the files a filter's values came from.
# Set to "" to disable.
filter_source_property_name = "filter.source"

# Placeholders look like <prefix>name<suffix>.
property_prefix = "${"
property_suffix = "}"

# Fail when a template uses a property some filter does not define.
# When false the missing properties are reported as a warning.
fail_on_missing_property = true
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.property_prefix, "${");
        assert_eq!(config.property_suffix, "}");
        assert_eq!(config.filter_source_property_name, "filter.source");
        assert!(config.fail_on_missing_property);
        assert!(config.log_output);
        assert_eq!(config.output_base_path, PathBuf::from("target/generated-config"));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: GeneratorConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn parse_partial_config() {
        let config: GeneratorConfig = toml::from_str(
            r#"
filters_base_path = "envs"
fail_on_missing_property = false
"#,
        )
        .unwrap();
        assert_eq!(config.filters_base_path, PathBuf::from("envs"));
        assert!(!config.fail_on_missing_property);
        assert_eq!(config.templates_base_path, PathBuf::from("src/config/templates"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<GeneratorConfig, _> = toml::from_str("fail_on_missing = false\n");
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_overlay_wins() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3\nc = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
        assert_eq!(merged["c"].as_integer(), Some(4));
    }

    #[test]
    fn load_config_layers_file_and_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "filters_base_path = \"envs\"\noutput_base_path = \"out\"\n",
        )
        .unwrap();
        let overrides: toml::Value = toml::from_str("output_base_path = \"cli-out\"\n").unwrap();

        let config = load_config(&path, Some(overrides)).unwrap();
        assert_eq!(config.filters_base_path, PathBuf::from("envs"));
        assert_eq!(config.output_base_path, PathBuf::from("cli-out"));
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml"), None).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "encoding = \n").unwrap();
        assert!(matches!(load_config(&path, None), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn empty_prefix_fails_validation() {
        let config = GeneratorConfig {
            property_prefix: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_output_path_fails_validation() {
        let config = GeneratorConfig {
            output_base_path: PathBuf::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_base_path"));
    }

    #[test]
    fn unsupported_encoding_fails_validation() {
        let config = GeneratorConfig {
            encoding: "EBCDIC".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_encoding_falls_back_to_utf8() {
        let config = GeneratorConfig {
            encoding: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_encoding(), Encoding::Utf8);
    }

    #[test]
    fn normalize_dedupes_and_drops_blanks() {
        let mut config = GeneratorConfig {
            templates_to_ignore: vec![
                PathBuf::from(" a "),
                PathBuf::from(""),
                PathBuf::from("a"),
                PathBuf::from("b"),
            ],
            ..Default::default()
        };
        config.normalize();
        assert_eq!(
            config.templates_to_ignore,
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
    }

    #[test]
    fn source_property_name_can_be_disabled() {
        let config = GeneratorConfig {
            filter_source_property_name: String::new(),
            ..Default::default()
        };
        assert_eq!(config.source_property_name(), None);
        assert_eq!(
            GeneratorConfig::default().source_property_name(),
            Some("filter.source")
        );
    }
}
