//! Property file loading.
//!
//! Filters are plain property files, one `key=value` mapping per logical line:
//!
//! ```text
//! # comment
//! ! also a comment
//! db.host = localhost
//! db.port: 5432
//! greeting Hello world
//! long.value = first part \
//!              second part
//! path = C:\\temp\\out
//! ```
//!
//! - Keys end at the first unescaped `=`, `:` or whitespace.
//! - Whitespace around the separator is dropped; trailing whitespace on the
//!   value is kept.
//! - A line ending in an odd number of backslashes continues onto the next
//!   line, with the continuation's leading whitespace removed.
//! - Escapes `\t \n \r \f \uXXXX` are decoded; any other escaped character
//!   stands for itself.
//!
//! Within one file a later duplicate key replaces the earlier value but keeps
//! the position of the first occurrence.

use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("Cannot read property file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed property file {path}, line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("{path} is not valid {encoding}")]
    Decode { path: PathBuf, encoding: Encoding },
}

/// Character encoding used for property files, templates and generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Look up an encoding by its usual name. Matching ignores case, `-` and `_`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "utf8" => Some(Encoding::Utf8),
            "iso88591" | "latin1" | "usascii" | "ascii" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    /// Decode raw file bytes. Returns `None` when the bytes are not valid.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Encode text for writing. Returns `None` if a character has no
    /// representation in this encoding.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
            Encoding::Latin1 => text.chars().map(|c| u8::try_from(c).ok()).collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("UTF-8"),
            Encoding::Latin1 => f.write_str("ISO-8859-1"),
        }
    }
}

/// Read a text file under the given encoding.
pub fn read_text(path: &Path, encoding: Encoding) -> Result<String, PropertiesError> {
    let bytes = fs::read(path).map_err(|source| PropertiesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    encoding
        .decode(&bytes)
        .ok_or_else(|| PropertiesError::Decode {
            path: path.to_path_buf(),
            encoding,
        })
}

/// Load one property file into an ordered key → value map.
pub fn load(path: &Path, encoding: Encoding) -> Result<IndexMap<String, String>, PropertiesError> {
    let content = read_text(path, encoding)?;
    parse(&content).map_err(|(line, reason)| PropertiesError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    })
}

/// Parse property text. Errors carry the 1-based line number where the
/// offending logical line starts.
pub fn parse(content: &str) -> Result<IndexMap<String, String>, (usize, String)> {
    let mut map = IndexMap::new();
    let mut lines = content.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let start_line = idx + 1;
        let first = raw.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = String::from(first);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        let key = unescape(key).map_err(|reason| (start_line, reason))?;
        if key.is_empty() {
            return Err((start_line, "missing key".to_string()));
        }
        let value = unescape(value).map_err(|reason| (start_line, reason))?;
        map.insert(key, value);
    }

    Ok(map)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line into raw (still escaped) key and value parts.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                return (&line[..i], line[i + 1..].trim_start());
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start();
    // `key = value` with whitespace before the separator
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape \\u{hex}"))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
