//! `movie-rating-extremes` joins a movie catalog with a stream of rating events, computes the
//! rating count and mean of every title, and reports the best and worst rated titles.
//!
//! The primary entrypoint is [`pipeline::run_pipeline`], a pure function from the two datasets'
//! lines to a [`processing::Report`]. [`execution::ExecutionEngine`] runs the same pipeline in
//! parallel chunks and produces the same report.
//!
//! ## What goes in
//!
//! - **Movies**: a header line, then `id,title,genres` lines. Titles containing commas are
//!   expected to be wrapped in double quotes.
//! - **Ratings**: a header line, then `userId,movieId,rating,timestamp` lines.
//!
//! Either dataset can be a single file or a directory of partition files
//! (see [`ingestion::lines`]).
//!
//! ## What comes out
//!
//! Two sections, best and worst. Each holds the titles whose mean rating equals the global
//! maximum (resp. minimum), narrowed to the five most-rated of them plus anything tied with the
//! fifth, sorted alphabetically:
//!
//! ```text
//! Top Movies, sorted alphabetically:
//!
//! A, rating: 5/5
//! B, rating: 5/5
//!
//! Bottom Movies, sorted alphabetically:
//!
//! C, rating: 1/5
//! ```
//!
//! ## Quick example
//!
//! ```rust
//! use movie_rating_extremes::pipeline::{run_pipeline, PipelineOptions};
//! use movie_rating_extremes::processing::RenderOptions;
//!
//! # fn main() -> Result<(), movie_rating_extremes::PipelineError> {
//! let movies = ["movieId,title,genres", "1,A,Comedy", "2,B,Drama", "3,C,Drama"];
//! let ratings = [
//!     "userId,movieId,rating,timestamp",
//!     "u1,1,5.0,0",
//!     "u2,1,5.0,0",
//!     "u3,2,5.0,0",
//!     "u4,3,1.0,0",
//! ];
//!
//! let report = run_pipeline(&movies, &ratings, &PipelineOptions::default())?;
//! let lines = report.render_lines(&RenderOptions::default());
//! assert_eq!(lines[2], "A, rating: 5/5");
//! assert_eq!(lines[3], "B, rating: 5/5");
//! assert_eq!(lines[7], "C, rating: 1/5");
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading from disk
//!
//! ```no_run
//! use movie_rating_extremes::pipeline::{run_pipeline_from_paths, PipelineOptions};
//!
//! # fn main() -> Result<(), movie_rating_extremes::PipelineError> {
//! // `ratings/` may be a directory of part-* files.
//! let report = run_pipeline_from_paths("movies.csv", "ratings/", &PipelineOptions::default())?;
//! print!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: line sources, record parsing, ingestion observers
//! - [`processing`]: join, aggregation, extreme selection, report rendering
//! - [`pipeline`]: the sequential end-to-end run and its options
//! - [`execution`]: the parallel engine, its metrics and observers
//! - [`types`]: records and derived statistics
//! - [`error`]: the error type shared by all of the above

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{PipelineError, PipelineResult};
