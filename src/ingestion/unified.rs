//! Dataset-level ingestion entrypoints.
//!
//! - [`ingest_movies`] / [`ingest_ratings`] parse lines that are already in memory.
//! - [`ingest_movies_from_path`] / [`ingest_ratings_from_path`] read a file or a partitioned
//!   directory first (see [`super::lines`]).
//!
//! If an [`IngestionObserver`] is configured, skipped lines, success and failure (plus alerts
//! at or above [`IngestionOptions::alert_at_or_above`]) are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Movie, Rating};

use super::lines::{read_lines_from_path, LineOptions};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::records::{parse_records, MalformedLinePolicy, ParsedRecords, Record, SplitStrategy};

/// Options controlling dataset ingestion.
///
/// Use [`Default`] for the reference behavior: quote heuristic, fail on the first bad line.
#[derive(Clone)]
pub struct IngestionOptions {
    /// How data lines are split into fields.
    pub split_strategy: SplitStrategy,
    /// Whether a bad data line aborts ingestion.
    pub malformed_lines: MalformedLinePolicy,
    /// Decoding and partition discovery for path-based inputs.
    pub lines: LineOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("split_strategy", &self.split_strategy)
            .field("malformed_lines", &self.malformed_lines)
            .field("lines", &self.lines)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            split_strategy: SplitStrategy::default(),
            malformed_lines: MalformedLinePolicy::default(),
            lines: LineOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Parse a movie catalog (header line first).
///
/// ```rust
/// use movie_rating_extremes::ingestion::{ingest_movies, IngestionOptions};
///
/// let lines = [
///     "movieId,title,genres",
///     "1,Toy Story (1995),Adventure|Animation",
///     r#"11,"American President, The (1995)",Comedy|Drama"#,
/// ];
/// let movies = ingest_movies(&lines, &IngestionOptions::default()).unwrap();
/// assert_eq!(movies[1].title, "American President, The (1995)");
/// ```
pub fn ingest_movies<S: AsRef<str>>(lines: &[S], options: &IngestionOptions) -> PipelineResult<Vec<Movie>> {
    ingest_lines(lines, None, options)
}

/// Parse a rating event stream (header line first).
pub fn ingest_ratings<S: AsRef<str>>(lines: &[S], options: &IngestionOptions) -> PipelineResult<Vec<Rating>> {
    ingest_lines(lines, None, options)
}

/// Read and parse a movie catalog from a file or partitioned directory.
pub fn ingest_movies_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> PipelineResult<Vec<Movie>> {
    let path = path.as_ref();
    let lines = read_dataset_lines::<Movie>(path, options)?;
    ingest_lines(&lines, Some(path), options)
}

/// Read and parse rating events from a file or partitioned directory.
pub fn ingest_ratings_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> PipelineResult<Vec<Rating>> {
    let path = path.as_ref();
    let lines = read_dataset_lines::<Rating>(path, options)?;
    ingest_lines(&lines, Some(path), options)
}

/// Read the raw lines of a dataset, reporting read failures to the observer.
pub(crate) fn read_dataset_lines<T: Record>(path: &Path, options: &IngestionOptions) -> PipelineResult<Vec<String>> {
    read_lines_from_path(path, &options.lines).inspect_err(|e| {
        let ctx = IngestionContext {
            dataset: T::DATASET,
            source: Some(path.to_path_buf()),
        };
        notify_failure(&ctx, options, e);
    })
}

fn ingest_lines<T, S>(lines: &[S], source: Option<&Path>, options: &IngestionOptions) -> PipelineResult<Vec<T>>
where
    T: Record,
    S: AsRef<str>,
{
    let ctx = IngestionContext {
        dataset: T::DATASET,
        source: source.map(Path::to_path_buf),
    };
    let result = parse_records::<T, S>(lines, options.split_strategy, options.malformed_lines);
    report_outcome(&ctx, options, lines.len().saturating_sub(1), result)
}

/// Report a parse outcome to the configured observer and unwrap the records.
pub(crate) fn report_outcome<T>(
    ctx: &IngestionContext,
    options: &IngestionOptions,
    data_lines: usize,
    result: PipelineResult<ParsedRecords<T>>,
) -> PipelineResult<Vec<T>> {
    match result {
        Ok(parsed) => {
            if let Some(obs) = options.observer.as_ref() {
                for skipped in &parsed.skipped {
                    obs.on_skipped_line(ctx, skipped.line, &skipped.error);
                }
                obs.on_success(
                    ctx,
                    IngestionStats {
                        lines: data_lines,
                        records: parsed.records.len(),
                        skipped: parsed.skipped.len(),
                    },
                );
            }
            Ok(parsed.records)
        }
        Err(e) => {
            notify_failure(ctx, options, &e);
            Err(e)
        }
    }
}

fn notify_failure(ctx: &IngestionContext, options: &IngestionOptions, e: &PipelineError) {
    if let Some(obs) = options.observer.as_ref() {
        let sev = IngestionSeverity::for_error(e);
        obs.on_failure(ctx, sev, e);
        if sev >= options.alert_at_or_above {
            obs.on_alert(ctx, sev, e);
        }
    }
}
