//! Directory scanning for filters and templates.
//!
//! Both inputs of a run are plain directory trees. Every regular file below
//! the root becomes a [`FileEntry`]; directories are traversed but never
//! emitted themselves.
//!
//! ```text
//! src/config/filters/              # Filter root
//! ├── dev.properties               # relative_dir = ""
//! ├── prod.properties
//! └── eu/
//!     └── prod.properties          # relative_dir = "eu"
//!
//! src/config/templates/            # Template root
//! ├── app.conf
//! └── bin/
//!     └── start.sh                 # relative_dir = "bin"
//! ```
//!
//! ## Ignore Rules
//!
//! Ignore entries are path prefixes, not globs. A file is skipped when its
//! absolute path starts with an ignore entry, compared component by
//! component: ignoring `templates/common` skips `templates/common/x.conf` but
//! keeps `templates/common-extra/x.conf`. Ignored directories are pruned so
//! nothing below them is visited.
//!
//! ## Overlay Files
//!
//! A filter may have counterparts under external filter roots at the same
//! relative path. [`lookup_overlay_files`] collects them in root order; they
//! supply lower-priority values when the filter is resolved.
//!
//! Entries are returned in a stable order: sorted by file name at every level.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory does not exist: {0}")]
    DirectoryMissing(PathBuf),
    #[error("IO error while scanning {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Cannot walk {root}: {source}")]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

/// One discovered filter or template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Containing directory relative to the scan root, `/`-separated.
    /// Empty for files directly in the root.
    pub relative_dir: String,
    /// File name including extension (`dev.properties`).
    pub name: String,
    /// File name with the last extension removed (`dev`).
    pub stem: String,
    /// Same-path files under external filter roots, in priority order.
    pub overlays: Vec<PathBuf>,
}

impl FileEntry {
    /// Path relative to the scan root, `/`-separated (`eu/prod.properties`).
    pub fn relative_path(&self) -> String {
        if self.relative_dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.relative_dir, self.name)
        }
    }

    /// The primary file followed by its overlays, highest priority first.
    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.overlays.iter().map(PathBuf::as_path))
    }

    /// Human-readable list of every contributing file.
    ///
    /// ```text
    /// [eu/prod.properties, /shared/filters/eu/prod.properties]
    /// ```
    pub fn describe_sources(&self) -> String {
        let names: Vec<String> = std::iter::once(self.relative_path())
            .chain(self.overlays.iter().map(|p| to_slash(p)))
            .collect();
        format!("[{}]", names.join(", "))
    }
}

/// Normalised ignore prefixes.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    prefixes: Vec<PathBuf>,
}

impl IgnoreList {
    /// Build from configured entries. Blank entries are dropped; entries that
    /// do not exist on disk are kept and still honoured.
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut prefixes: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            if entry.as_os_str().is_empty() {
                continue;
            }
            let normalized = absolute_normalized(entry);
            if !prefixes.contains(&normalized) {
                prefixes.push(normalized);
            }
        }
        Self { prefixes }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// Recursively list every file below `root` that is not ignored.
///
/// A missing root is not fatal: it is logged as a warning and yields no
/// entries. An empty result also produces a warning.
pub fn scan(root: &Path, ignore: &IgnoreList) -> Result<Vec<FileEntry>, ScanError> {
    let entries = match walk(root, ignore) {
        Ok(entries) => entries,
        Err(ScanError::DirectoryMissing(path)) => {
            warn!("Directory does not exist: {}", path.display());
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    if entries.is_empty() {
        warn!("No files found in directory: {}", root.display());
    }
    Ok(entries)
}

fn walk(root: &Path, ignore: &IgnoreList) -> Result<Vec<FileEntry>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryMissing(root.to_path_buf()));
    }
    let canonical_root = root.canonicalize().map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    debug!(
        "Reading from: {}, ignoring: {:?}",
        canonical_root.display(),
        ignore.prefixes
    );

    let walker = WalkDir::new(&canonical_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let skip = ignore.is_ignored(e.path());
            if skip {
                debug!("Ignoring: {}", e.path().display());
            }
            !skip
        });

    let mut entries = Vec::new();
    for item in walker {
        let item = item.map_err(|source| ScanError::Walk {
            root: canonical_root.clone(),
            source,
        })?;
        if !item.file_type().is_file() {
            continue;
        }
        let path = item.into_path();
        let entry = file_entry(&canonical_root, path);
        debug!("Adding file: {}", entry.path.display());
        entries.push(entry);
    }
    Ok(entries)
}

fn file_entry(root: &Path, path: PathBuf) -> FileEntry {
    let relative_dir = path
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(to_slash)
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());
    FileEntry {
        path,
        relative_dir,
        name,
        stem,
        overlays: Vec::new(),
    }
}

/// Find files at the entry's relative path under each external base path.
///
/// Returns matches in base path order; missing files are skipped.
pub fn lookup_overlay_files(entry: &FileEntry, external_base_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut overlays = Vec::new();
    for base in external_base_paths {
        let candidate = base.join(&entry.relative_dir).join(&entry.name);
        debug!("Searching for: {}", to_slash(&candidate));
        if candidate.is_file() {
            debug!("Including external file: {}", to_slash(&candidate));
            overlays.push(candidate);
        }
    }
    overlays
}

/// Scan a filter root and attach overlay files to every entry.
pub fn scan_filters(
    root: &Path,
    ignore: &IgnoreList,
    external_base_paths: &[PathBuf],
) -> Result<Vec<FileEntry>, ScanError> {
    let mut filters = scan(root, ignore)?;
    for filter in &mut filters {
        filter.overlays = lookup_overlay_files(filter, external_base_paths);
    }
    Ok(filters)
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path absolute and resolve `.` and `..` lexically.
///
/// Existing paths are canonicalized so they compare equal to walked entries
/// even when the scan root sits behind a symlink.
fn absolute_normalized(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
