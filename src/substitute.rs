//! Placeholder substitution with missing-value detection.
//!
//! Templates reference filter properties as `prefix + key + suffix`, `${key}`
//! by default. Substitution is a single literal pass: replaced values are never
//! scanned again, and placeholders naming keys that no filter defines are left
//! untouched.
//!
//! ## Missing Values
//!
//! Every filter of a run is expected to define every key that any filter
//! defines. Before rendering, each expected key absent from the current filter
//! is given a sentinel value:
//!
//! ```text
//! ${db.password}   →   <<<<<<< db.password >>>>>>>
//! ```
//!
//! After rendering, one regex pass over the output recovers the exact set of
//! missing keys the template actually used. When the filter defines every
//! expected key the regex pass is skipped entirely.

use crate::filter::PropertyMapping;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::borrow::Cow;

/// Placeholder delimiters, e.g. `${` and `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSyntax {
    pub prefix: String,
    pub suffix: String,
}

impl PlaceholderSyntax {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// The placeholder text for `key` (`${key}`).
    pub fn placeholder(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, key, self.suffix)
    }
}

impl Default for PlaceholderSyntax {
    fn default() -> Self {
        Self::new("${", "}")
    }
}

/// Marker wrapped around a missing key so it can be located in rendered text.
#[derive(Debug, Clone)]
pub struct Sentinel {
    prefix: String,
    suffix: String,
    pattern: Regex,
}

pub const SENTINEL_PREFIX: &str = "<<<<<<< ";
pub const SENTINEL_SUFFIX: &str = " >>>>>>>";

impl Sentinel {
    pub fn new(prefix: &str, suffix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            "(?s){}(.*?){}",
            regex::escape(prefix),
            regex::escape(suffix)
        ))?;
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            pattern,
        })
    }

    /// The sentinel value standing in for `key`.
    pub fn mark(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, key, self.suffix)
    }

    /// Distinct non-blank keys marked in `text`, in order of first appearance.
    pub fn find_marked(&self, text: &str) -> IndexSet<String> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|key| !key.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::new(SENTINEL_PREFIX, SENTINEL_SUFFIX).expect("escaped sentinel pattern must compile")
    }
}

/// Result of rendering one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Expected keys the template referenced but the filter lacks.
    pub missing: IndexSet<String>,
}

impl Rendered {
    pub fn found_all(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Substitution state for one filter, reused across every template.
#[derive(Debug)]
pub struct Substitutor<'a> {
    values: IndexMap<&'a str, Cow<'a, str>>,
    syntax: &'a PlaceholderSyntax,
    sentinel: &'a Sentinel,
    any_missing: bool,
}

impl<'a> Substitutor<'a> {
    /// Prepare substitution for `mapping`, marking every key of
    /// `expected_keys` that the mapping does not define.
    pub fn new(
        mapping: &'a PropertyMapping,
        expected_keys: &'a IndexSet<String>,
        syntax: &'a PlaceholderSyntax,
        sentinel: &'a Sentinel,
    ) -> Self {
        let mut values: IndexMap<&'a str, Cow<'a, str>> = mapping
            .iter()
            .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())))
            .collect();
        let mut any_missing = false;
        for key in expected_keys {
            if !mapping.contains_key(key) {
                values.insert(key.as_str(), Cow::Owned(sentinel.mark(key)));
                any_missing = true;
            }
        }
        Self {
            values,
            syntax,
            sentinel,
            any_missing,
        }
    }

    /// Whether this filter lacks any expected key.
    pub fn any_missing(&self) -> bool {
        self.any_missing
    }

    pub fn render(&self, template: &str) -> Rendered {
        let (text, _) = replace_placeholders(template, self.syntax, |key| {
            self.values.get(key).map(|v| v.as_ref())
        });
        let missing = if self.any_missing {
            self.sentinel.find_marked(&text)
        } else {
            IndexSet::new()
        };
        Rendered { text, missing }
    }
}

/// Render `template` against `mapping` alone, with no expected-key checking.
///
/// Returns the text and whether every complete placeholder had a value.
/// Placeholders without a value are left in the text verbatim.
pub fn render(template: &str, mapping: &PropertyMapping, syntax: &PlaceholderSyntax) -> (String, bool) {
    let (text, unresolved) =
        replace_placeholders(template, syntax, |key| mapping.get(key).map(String::as_str));
    (text, !unresolved)
}

/// Replace every `prefix + key + suffix` whose key `lookup` resolves.
///
/// Unresolved placeholders are copied through verbatim and scanning resumes
/// right after their prefix, so a stray prefix never swallows a later
/// placeholder. The flag is set when a complete placeholder had no value. An
/// empty prefix matches nothing.
fn replace_placeholders<'v, F>(
    template: &str,
    syntax: &PlaceholderSyntax,
    lookup: F,
) -> (String, bool)
where
    F: Fn(&str) -> Option<&'v str>,
{
    let prefix = syntax.prefix.as_str();
    let suffix = syntax.suffix.as_str();
    if prefix.is_empty() {
        return (template.to_string(), false);
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut unresolved = false;

    while let Some(start) = rest.find(prefix) {
        out.push_str(&rest[..start]);
        let after_prefix = &rest[start + prefix.len()..];
        match after_prefix.find(suffix) {
            Some(end) => {
                let key = &after_prefix[..end];
                match lookup(key) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after_prefix[end + suffix.len()..];
                    }
                    None => {
                        unresolved = true;
                        out.push_str(prefix);
                        rest = after_prefix;
                    }
                }
            }
            None => {
                out.push_str(prefix);
                rest = after_prefix;
            }
        }
    }
    out.push_str(rest);
    (out, unresolved)
}
