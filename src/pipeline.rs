//! Sequential end-to-end pipeline.
//!
//! [`run_pipeline`] is a pure function from (movie lines, rating lines) to a [`Report`]. Any
//! fatal error aborts the run before a report exists. For the chunked parallel equivalent see
//! [`crate::execution::ExecutionEngine::run_pipeline`].

use std::path::Path;

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::{
    ingest_movies, ingest_movies_from_path, ingest_ratings, ingest_ratings_from_path, IngestionOptions,
};
use crate::processing::{
    aggregate, build_report, join, select_extremes, DuplicateIdPolicy, MovieIndex, Report, Selection,
    DEFAULT_TOP_K,
};
use crate::types::{Movie, MovieStats, Rating};

/// Options for a whole pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Options shared by both datasets.
    pub ingestion: IngestionOptions,
    /// How repeated catalog ids are handled by the join.
    pub duplicate_ids: DuplicateIdPolicy,
    /// Most-rated titles kept per extreme (ties at the threshold are kept too).
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            ingestion: IngestionOptions::default(),
            duplicate_ids: DuplicateIdPolicy::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl PipelineOptions {
    /// Reject options that cannot produce a report.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.top_k == 0 {
            return Err(PipelineError::InvalidOptions {
                message: "top_k must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Every intermediate result of a run, for callers that need more than the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieAnalysis {
    /// Per-title stats ordered by title.
    pub stats: Vec<MovieStats>,
    pub top: Selection,
    pub bottom: Selection,
    pub report: Report,
}

/// Run the whole pipeline over lines already in memory and return the report.
///
/// ```rust
/// use movie_rating_extremes::pipeline::{run_pipeline, PipelineOptions};
///
/// let movies = ["movieId,title,genres", "1,A,Comedy", "2,B,Drama", "3,C,Drama"];
/// let ratings = [
///     "userId,movieId,rating,timestamp",
///     "u1,1,5.0,0",
///     "u2,1,5.0,0",
///     "u3,2,5.0,0",
///     "u4,3,1.0,0",
/// ];
/// let report = run_pipeline(&movies, &ratings, &PipelineOptions::default()).unwrap();
/// assert_eq!(report.top.len(), 2);
/// assert_eq!(report.bottom[0].title, "C");
/// ```
pub fn run_pipeline<M, R>(movie_lines: &[M], rating_lines: &[R], options: &PipelineOptions) -> PipelineResult<Report>
where
    M: AsRef<str>,
    R: AsRef<str>,
{
    analyze(movie_lines, rating_lines, options).map(|a| a.report)
}

/// Like [`run_pipeline`] but returns every intermediate result.
pub fn analyze<M, R>(movie_lines: &[M], rating_lines: &[R], options: &PipelineOptions) -> PipelineResult<MovieAnalysis>
where
    M: AsRef<str>,
    R: AsRef<str>,
{
    options.validate()?;
    let movies = ingest_movies(movie_lines, &options.ingestion)?;
    let ratings = ingest_ratings(rating_lines, &options.ingestion)?;
    analyze_records(&movies, &ratings, options)
}

/// Run the join → aggregate → select → report stages over parsed records.
pub fn analyze_records(movies: &[Movie], ratings: &[Rating], options: &PipelineOptions) -> PipelineResult<MovieAnalysis> {
    options.validate()?;

    let index = MovieIndex::build(movies, options.duplicate_ids)?;
    let joined = join(&index, ratings);
    log::debug!(
        "joined {} of {} ratings against {} movies",
        joined.len(),
        ratings.len(),
        index.len()
    );

    let stats = aggregate(&joined).to_stats();
    log::debug!("aggregated {} titles", stats.len());

    let (top, bottom) = select_extremes(&stats, options.top_k)?;
    log::debug!(
        "selected {} top titles (mean {:?}) and {} bottom titles (mean {:?})",
        top.titles.len(),
        top.extreme_value,
        bottom.titles.len(),
        bottom.extreme_value
    );

    let report = build_report(&top, &bottom);
    Ok(MovieAnalysis {
        stats,
        top,
        bottom,
        report,
    })
}

/// Read both datasets from files or partitioned directories and run the pipeline.
pub fn run_pipeline_from_paths(
    movies_path: impl AsRef<Path>,
    ratings_path: impl AsRef<Path>,
    options: &PipelineOptions,
) -> PipelineResult<Report> {
    options.validate()?;
    let movies = ingest_movies_from_path(movies_path, &options.ingestion)?;
    let ratings = ingest_ratings_from_path(ratings_path, &options.ingestion)?;
    analyze_records(&movies, &ratings, options).map(|a| a.report)
}
