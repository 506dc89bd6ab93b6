//! Ingestion: raw lines in, typed [`crate::types::Movie`] / [`crate::types::Rating`] records out.
//!
//! Most callers should use the entrypoints from [`unified`], which:
//!
//! - read a file or a directory of partition files (or take lines already in memory)
//! - discard the header line and parse each data line positionally
//! - optionally report success/failure/skipped lines to an [`IngestionObserver`]
//!
//! Lower-level pieces live in:
//! - [`lines`]: line sources and text normalization
//! - [`records`]: the field splitters and per-line record parsing

pub mod lines;
pub mod observability;
pub mod records;
pub mod unified;

pub use lines::{read_lines, read_lines_from_path, LineOptions};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver, StdErrObserver,
};
pub use records::{MalformedLinePolicy, ParsedRecords, Record, SkippedLine, SplitStrategy};
pub use unified::{
    ingest_movies, ingest_movies_from_path, ingest_ratings, ingest_ratings_from_path, IngestionOptions,
};
