use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::table::DEFAULT_MAPPING_CSV;
use super::MappingTable;

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("mapping source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read mapping source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("mapping source {} is not valid UTF-8 (line {line})", .path.display())]
    Decode { path: PathBuf, line: usize },
    #[error("mapping source {} contains no usable rows", .0.display())]
    Empty(PathBuf),
}

/// Result of loading a source that could be read at all.
///
/// A missing or empty source is not fatal: the table comes back empty and
/// `warning` says why, so the caller can keep running or bootstrap defaults.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: MappingTable,
    pub warning: Option<MappingError>,
}

impl MappingTable {
    /// Load a two-column delimited source from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadOutcome, MappingError> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "mapping source missing");
                return Ok(LoadOutcome {
                    table: MappingTable::new(),
                    warning: Some(MappingError::NotFound(path.to_path_buf())),
                });
            }
            Err(source) => {
                return Err(MappingError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            MappingError::Decode {
                path: path.to_path_buf(),
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            }
        })?;

        let table = MappingTable::from_csv_str(&content);
        debug!(path = %path.display(), entries = table.len(), "mapping source loaded");
        let warning = if table.is_empty() {
            warn!(path = %path.display(), "mapping source has no usable rows");
            Some(MappingError::Empty(path.to_path_buf()))
        } else {
            None
        };
        Ok(LoadOutcome { table, warning })
    }
}

/// Write the built-in table to `path` unless a file already exists there.
/// Returns `true` when a new file was created.
pub fn ensure_source(path: impl AsRef<Path>) -> Result<bool, MappingError> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    let io_err = |source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, DEFAULT_MAPPING_CSV).map_err(io_err)?;
    Ok(true)
}

/// Parse delimited text into `(sequence, glyph)` pairs in file order.
///
/// - fields are comma-separated, optionally double-quoted (`""` escapes a quote)
/// - each field is trimmed; rows with fewer than two fields are skipped
/// - rows whose sequence or glyph is empty after trimming are skipped
/// - columns past the second are ignored
pub fn parse_rows(content: &str) -> Vec<(String, String)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .filter_map(|line| {
            let mut fields = split_fields(line).into_iter();
            let seq = fields.next()?;
            let glyph = fields.next()?;
            let (seq, glyph) = (seq.trim(), glyph.trim());
            if seq.is_empty() || glyph.is_empty() {
                return None;
            }
            Some((seq.to_string(), glyph.to_string()))
        })
        .collect()
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

pub(super) fn quote_field(field: &str) -> String {
    if field.contains([',', '"']) || field.trim() != field {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
