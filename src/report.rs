//! Missing property report aggregated over a whole run.
//!
//! Keys are filter file paths, values the placeholder names that filter
//! could not supply. Both levels keep insertion order so the report reads in
//! scan order:
//!
//! ```text
//! Missing properties identified:
//! /project/src/config/filters/dev.properties: db.password, smtp.host
//! /project/src/config/filters/eu/prod.properties: feature.flags
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MissingPropertyReport {
    by_filter: IndexMap<String, IndexSet<String>>,
}

impl MissingPropertyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `keys` as missing for `filter`. Empty key sets add nothing.
    pub fn merge<I>(&mut self, filter: &str, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return;
        }
        self.by_filter
            .entry(filter.to_string())
            .or_default()
            .extend(keys);
    }

    pub fn is_empty(&self) -> bool {
        self.by_filter.is_empty()
    }

    /// Number of filters with at least one missing property.
    pub fn filter_count(&self) -> usize {
        self.by_filter.len()
    }

    pub fn missing_for(&self, filter: &str) -> Option<&IndexSet<String>> {
        self.by_filter.get(filter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.by_filter.iter().map(|(f, keys)| (f.as_str(), keys))
    }
}

impl fmt::Display for MissingPropertyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Missing properties identified:")?;
        for (filter, keys) in self.iter() {
            let joined: Vec<&str> = keys.iter().map(String::as_str).collect();
            writeln!(f, "{}: {}", filter, joined.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn empty_merge_adds_nothing() {
        let mut report = MissingPropertyReport::new();
        report.merge("/f/dev.properties", Vec::new());
        assert!(report.is_empty());
    }

    #[test]
    fn merges_accumulate_without_duplicates() {
        let mut report = MissingPropertyReport::new();
        report.merge("/f/dev.properties", owned(&["b", "a"]));
        report.merge("/f/dev.properties", owned(&["a", "c"]));
        let keys: Vec<&String> = report.missing_for("/f/dev.properties").unwrap().iter().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(report.filter_count(), 1);
    }

    #[test]
    fn display_lists_filters_in_insertion_order() {
        let mut report = MissingPropertyReport::new();
        report.merge("/f/prod.properties", owned(&["x"]));
        report.merge("/f/dev.properties", owned(&["y", "z"]));
        assert_eq!(
            report.to_string(),
            "Missing properties identified:\n/f/prod.properties: x\n/f/dev.properties: y, z\n"
        );
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut report = MissingPropertyReport::new();
        report.merge("/f/dev.properties", owned(&["y"]));
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"/f/dev.properties":["y"]}"#);
    }
}
