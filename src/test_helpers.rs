//! Shared test utilities for the config-gen test suite.
//!
//! Tests build small filter/template trees in a temp directory and point a
//! [`GeneratorConfig`] at them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = write_tree(&[
//!     ("filters/dev.properties", "host=localhost\n"),
//!     ("templates/app.conf", "server=${host}"),
//! ]);
//! let summary = generate::run(&config_for(tmp.path())).unwrap();
//! assert_eq!(read_tree(&tmp.path().join("out"))["dev/app.conf"], "server=localhost");
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

use crate::config::GeneratorConfig;
use crate::filter::PropertyMapping;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory containing `files` as `(relative path, content)`.
pub fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (path, content) in files {
        write_bytes(tmp.path(), path, content.as_bytes());
    }
    tmp
}

/// Write raw bytes to `root/relative`, creating parent directories.
pub fn write_bytes(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
}

/// Copy `fixtures/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Config reading `<root>/filters` and `<root>/templates`, writing `<root>/out`.
pub fn config_for(root: &Path) -> GeneratorConfig {
    GeneratorConfig {
        filters_base_path: root.join("filters"),
        templates_base_path: root.join("templates"),
        output_base_path: root.join("out"),
        filter_source_property_name: String::new(),
        ..Default::default()
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Every file below `root` as `relative path → content`, `/`-separated.
pub fn read_tree(root: &Path) -> BTreeMap<String, String> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let key = rel.to_string_lossy().replace('\\', "/");
            (key, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

/// Mapping entries in order, as string slices.
pub fn mapping_pairs(mapping: &PropertyMapping) -> Vec<(&str, &str)> {
    mapping
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
