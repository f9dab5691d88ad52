//! Filter resolution: one filter file plus its overlays → one property mapping.
//!
//! A filter's values come from several files, highest priority first:
//!
//! ```text
//! src/config/filters/eu/prod.properties      # primary filter
//! ../shared/filters/eu/prod.properties       # overlay from external base path 1
//! ../global/filters/eu/prod.properties       # overlay from external base path 2
//! ```
//!
//! The first file defining a key wins. Overlays therefore hold common values
//! that any environment can override. Key order follows first appearance
//! across the sources.
//!
//! When a source property name is configured (`filter.source` by default), a
//! synthetic property describing all contributing files is added so templates
//! can record where their values came from. It replaces any file-defined key
//! of the same name.

use crate::properties::{self, Encoding, PropertiesError};
use crate::scan::FileEntry;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Ordered key → value mapping for one filter.
pub type PropertyMapping = IndexMap<String, String>;

/// Load and merge every source of `filter` into one mapping.
pub fn resolve(
    filter: &FileEntry,
    encoding: Encoding,
    source_property_name: Option<&str>,
) -> Result<PropertyMapping, PropertiesError> {
    let mut mapping = PropertyMapping::new();
    for source in filter.sources() {
        let values = properties::load(source, encoding)?;
        for (key, value) in values {
            mapping.entry(key).or_insert(value);
        }
    }

    if let Some(name) = source_property_name.map(str::trim).filter(|n| !n.is_empty()) {
        mapping.insert(name.to_string(), filter.describe_sources());
    }

    debug!(
        "Resolved {} properties for {}",
        mapping.len(),
        filter.relative_path()
    );
    Ok(mapping)
}

/// Every key defined by any of the mappings, in first-seen order.
///
/// These are the keys a template may legitimately reference; a key present
/// here but absent from one filter is a missing property for that filter.
pub fn all_property_keys<'a, I>(mappings: I) -> IndexSet<String>
where
    I: IntoIterator<Item = &'a PropertyMapping>,
{
    let mut keys = IndexSet::new();
    for mapping in mappings {
        keys.extend(mapping.keys().cloned());
    }
    keys
}
