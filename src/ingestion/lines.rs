//! Raw line sources.
//!
//! A dataset is either a single text file or a directory of partition files (the layout a
//! distributed job writes: `part-00000`, `part-00001`, ..., plus `_SUCCESS` markers). Partition
//! files are read in file-name order and concatenated, so the first line of the first partition
//! is the dataset header.
//!
//! Every line is normalized before parsing: a leading UTF-8 byte order mark is removed from the
//! first line of each file, and a trailing `\r` is removed from every line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

const BOM: char = '\u{feff}';

/// Options controlling how raw lines are read and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOptions {
    /// Replace invalid UTF-8 sequences with U+FFFD instead of failing.
    pub lossy_utf8: bool,
    /// Glob matched against file names when the input path is a directory.
    ///
    /// Names starting with `.` or `_` are always skipped.
    pub part_pattern: String,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            lossy_utf8: false,
            part_pattern: "*".to_string(),
        }
    }
}

/// Read all lines of a dataset from a file or a partitioned directory.
pub fn read_lines_from_path(path: impl AsRef<Path>, options: &LineOptions) -> PipelineResult<Vec<String>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return read_lines_from_file(path, options);
    }

    let mut lines = Vec::new();
    for part in partition_files(path, &options.part_pattern)? {
        lines.extend(read_lines_from_file(&part, options)?);
    }
    Ok(lines)
}

/// List the partition files of a directory in file-name order.
pub fn partition_files(dir: impl AsRef<Path>, pattern: &str) -> PipelineResult<Vec<PathBuf>> {
    let pattern = glob::Pattern::new(pattern)?;
    let mut out = Vec::new();
    for entry in WalkDir::new(dir.as_ref())
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if pattern.matches(&name) {
            out.push(entry.path().to_path_buf());
        }
    }
    Ok(out)
}

fn read_lines_from_file(path: &Path, options: &LineOptions) -> PipelineResult<Vec<String>> {
    let file = File::open(path)?;
    read_lines(BufReader::new(file), &path.display().to_string(), options)
}

/// Read and normalize all lines from a buffered reader.
///
/// `source_name` is only used in error messages.
pub fn read_lines<R: BufRead>(reader: R, source_name: &str, options: &LineOptions) -> PipelineResult<Vec<String>> {
    let mut out = Vec::new();
    for (idx, chunk) in reader.split(b'\n').enumerate() {
        let bytes = chunk?;
        let decoded = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) if options.lossy_utf8 => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            Err(_) => {
                return Err(PipelineError::Encoding {
                    source_name: source_name.to_string(),
                    line: idx + 1,
                });
            }
        };
        let line = normalize_line(&decoded);
        let line = if idx == 0 {
            line.strip_prefix(BOM).unwrap_or(line)
        } else {
            line
        };
        out.push(line.to_string());
    }
    Ok(out)
}

/// Strip a trailing carriage return left over from CRLF line endings.
pub fn normalize_line(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
