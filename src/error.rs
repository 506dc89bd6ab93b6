use thiserror::Error;

use crate::types::Dataset;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by ingestion and pipeline functions.
///
/// A single error enum shared by line reading, record parsing, joining and option validation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Field splitting error in RFC-4180 mode.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Error while walking a partitioned input directory.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The partition file pattern is not a valid glob.
    #[error("invalid partition pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A line is not valid UTF-8 and lossy decoding is disabled.
    #[error("invalid utf-8 in {source_name} at line {line}")]
    Encoding { source_name: String, line: usize },

    /// A data line did not split into enough fields.
    #[error("malformed {dataset} line {line}: expected {expected} fields, found {found} (raw='{raw}')")]
    MalformedLine {
        dataset: Dataset,
        line: usize,
        expected: usize,
        found: usize,
        raw: String,
    },

    /// A positional field could not be converted to its typed value.
    #[error("failed to parse {dataset} line {line} field '{field}': {message} (raw='{raw}')")]
    ParseError {
        dataset: Dataset,
        line: usize,
        field: &'static str,
        raw: String,
        message: String,
    },

    /// The catalog contains the same movie id twice and the fail-fast policy is active.
    #[error("duplicate movie id '{id}' (titles '{first_title}' and '{second_title}')")]
    DuplicateMovieId {
        id: String,
        first_title: String,
        second_title: String,
    },

    /// Options that cannot produce a meaningful run.
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },
}

impl PipelineError {
    /// `true` for errors confined to a single data line, which a skip policy may tolerate.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedLine { .. } | Self::ParseError { .. } | Self::Csv(_)
        )
    }
}
