//! Output path planning.
//!
//! Every (template, filter) pair renders to
//!
//! ```text
//! <output base>/<filter dir>/<filter stem>/<template dir>/<template name>
//! ```
//!
//! e.g. filter `eu/prod.properties` and template `bin/start.sh` become
//! `target/generated-config/eu/prod/bin/start.sh`. Empty segments (files at
//! the root of their tree) are dropped rather than producing doubled
//! separators.

use crate::scan::FileEntry;
use std::path::{Path, PathBuf};

/// Destination of `template` rendered with `filter`.
pub fn plan(template: &FileEntry, filter: &FileEntry, output_base: &Path) -> PathBuf {
    let mut path = output_base.to_path_buf();
    push_segments(&mut path, &filter.relative_dir);
    push_segments(&mut path, &filter.stem);
    push_segments(&mut path, &template.relative_dir);
    path.push(&template.name);
    path
}

/// Push each non-empty `/`- or `\`-separated part of `segment`.
fn push_segments(path: &mut PathBuf, segment: &str) {
    segment
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .for_each(|part| path.push(part));
}
