//! In-memory pipeline stages.
//!
//! Each stage is a pure function over the previous stage's output:
//!
//! - [`join`]: ratings → `(title, value)` pairs via an inner join on movie id
//! - [`aggregate`]: pairs → per-title count and mean
//! - [`extrema`]: stats → the tie-inclusive top-k titles at the max and min mean
//! - [`report`]: selections → alphabetical report lines
//!
//! ## Example: join → aggregate → select → report
//!
//! ```rust
//! use movie_rating_extremes::processing::{
//!     build_report, join_ratings, movie_stats, select_extremes, DuplicateIdPolicy, RenderOptions,
//! };
//! use movie_rating_extremes::types::{Movie, Rating};
//!
//! let movies = vec![
//!     Movie::new("1", "A", "Comedy"),
//!     Movie::new("2", "B", "Drama"),
//!     Movie::new("3", "C", "Drama"),
//! ];
//! let ratings = vec![
//!     Rating::new("u1", "1", 5.0, 0),
//!     Rating::new("u2", "1", 5.0, 0),
//!     Rating::new("u3", "2", 5.0, 0),
//!     Rating::new("u4", "3", 1.0, 0),
//! ];
//!
//! let joined = join_ratings(&movies, &ratings, DuplicateIdPolicy::FirstWins).unwrap();
//! let stats = movie_stats(&joined);
//! let (top, bottom) = select_extremes(&stats, 5).unwrap();
//! let report = build_report(&top, &bottom);
//!
//! let lines = report.render_lines(&RenderOptions::default());
//! assert!(lines.contains(&"A, rating: 5/5".to_string()));
//! assert!(lines.contains(&"C, rating: 1/5".to_string()));
//! ```

pub mod aggregate;
pub mod extrema;
pub mod join;
pub mod report;

pub use aggregate::{aggregate, movie_stats, StatsTable};
pub use extrema::{select, select_extremes, Extreme, Selection, DEFAULT_TOP_K};
pub use join::{join, join_ratings, DuplicateIdPolicy, MovieIndex};
pub use report::{build_report, RatingDisplay, RenderOptions, Report, ReportEntry};
