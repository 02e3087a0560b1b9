// src/report/patch.rs
// =============================================================================
// Rewrites one line of the audit tool's configuration file.
//
// The file is read whole, one line is swapped, and the result is written to
// a temporary file next to the target and renamed over it. A crash half way
// leaves either the old file or the new one, never a truncated mix.
//
// Everything else in the file is kept byte for byte, including the
// replaced line's own terminator (\n, \r\n, or none on the last line).
// =============================================================================

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{} has {total} line(s); cannot replace line {line}", .path.display())]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        total: usize,
    },

    #[error("could not read or write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not move the patched file into place at {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

// Replaces line `line` (1-based) of the file at `path` with `content`
pub fn replace_line(path: &Path, line: usize, content: &str) -> Result<(), PatchError> {
    let io_err = |source: io::Error| PatchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let original = fs::read_to_string(path).map_err(io_err)?;
    let patched = replace_line_in(&original, line, content).map_err(|total| PatchError::LineOutOfRange {
        path: path.to_path_buf(),
        line,
        total,
    })?;

    // Same directory, so the final rename never crosses filesystems
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(patched.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    // NamedTempFile is created 0600; keep whatever the original had
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(io_err)?;
    }

    tmp.persist(path).map_err(|source| PatchError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// Pure part of the above. Err carries the file's line count.
fn replace_line_in(text: &str, line: usize, content: &str) -> Result<String, usize> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    if line == 0 || line > lines.len() {
        return Err(lines.len());
    }

    let mut out = String::with_capacity(text.len() + content.len());
    for (i, current) in lines.iter().enumerate() {
        if i + 1 == line {
            out.push_str(content);
            out.push_str(line_ending(current));
        } else {
            out.push_str(current);
        }
    }
    Ok(out)
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
