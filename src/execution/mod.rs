//! Parallel execution of the pipeline over chunked inputs.
//!
//! This module sits "above" [`crate::ingestion`] and [`crate::processing`] and provides:
//!
//! - Chunked parsing, joining and aggregation on a dedicated rayon pool
//! - Resource limits / throttling (bounded in-flight chunks)
//! - Real-time metrics + observer hooks for monitoring
//!
//! Parsed chunks are merged in chunk order, so the engine yields the same records and the same
//! first error as the sequential [`crate::pipeline::run_pipeline`]. Per-title sums are exact
//! (see [`crate::types::RatingAccumulator`]), so the stats, and with them the report, do not
//! depend on chunk size or on how partial tables are grouped.

mod observer;
mod semaphore;

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::PipelineResult;
use crate::ingestion::records::{data_lines, parse_data_lines, ParsedRecords, Record, FIRST_DATA_LINE};
use crate::ingestion::unified::{read_dataset_lines, report_outcome};
use crate::ingestion::{IngestionContext, IngestionOptions};
use crate::pipeline::{MovieAnalysis, PipelineOptions};
use crate::processing::{aggregate, build_report, select_extremes, MovieIndex, Report, StatsTable};
use crate::types::{Dataset, JoinedRating, Movie, Rating};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
    PipelineStage, StdErrExecutionObserver,
};

use semaphore::ChunkGate;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of input rows (lines, ratings or joined pairs) per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 16_384,
            max_in_flight_chunks: n.max(1),
        }
    }
}

/// A configurable parallel executor for the rating pipeline.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`, `max_in_flight_chunks == 0`, or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> Self {
        assert!(opts.chunk_size > 0, "chunk_size must be > 0");
        assert!(
            opts.max_in_flight_chunks > 0,
            "max_in_flight_chunks must be > 0"
        );
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("rating-worker-{i}"))
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parse a dataset (header line first) in parallel chunks.
    pub fn parse_parallel<T, S>(&self, lines: &[S], options: &IngestionOptions) -> PipelineResult<Vec<T>>
    where
        T: Record,
        S: AsRef<str> + Sync,
    {
        self.tracked(|| self.parse_impl(lines, None, options))
    }

    /// Join ratings against a movie index in parallel chunks.
    pub fn join_parallel(&self, index: &MovieIndex, ratings: &[Rating]) -> Vec<JoinedRating> {
        self.tracked(|| self.join_impl(index, ratings))
    }

    /// Aggregate joined ratings in parallel chunks, merging partial tables in chunk order.
    pub fn aggregate_parallel(&self, joined: &[JoinedRating]) -> StatsTable {
        self.tracked(|| self.aggregate_impl(joined))
    }

    /// Run the whole pipeline; the parallel counterpart of [`crate::pipeline::run_pipeline`].
    pub fn run_pipeline<M, R>(
        &self,
        movie_lines: &[M],
        rating_lines: &[R],
        options: &PipelineOptions,
    ) -> PipelineResult<Report>
    where
        M: AsRef<str> + Sync,
        R: AsRef<str> + Sync,
    {
        self.analyze(movie_lines, rating_lines, options).map(|a| a.report)
    }

    /// Run the whole pipeline and keep every intermediate result.
    pub fn analyze<M, R>(
        &self,
        movie_lines: &[M],
        rating_lines: &[R],
        options: &PipelineOptions,
    ) -> PipelineResult<MovieAnalysis>
    where
        M: AsRef<str> + Sync,
        R: AsRef<str> + Sync,
    {
        self.tracked(|| self.analyze_impl(movie_lines, None, rating_lines, None, options))
    }

    /// Read both datasets from files or partitioned directories and run the pipeline.
    pub fn run_pipeline_from_paths(
        &self,
        movies_path: impl AsRef<Path>,
        ratings_path: impl AsRef<Path>,
        options: &PipelineOptions,
    ) -> PipelineResult<Report> {
        options.validate()?;
        let movies_path = movies_path.as_ref();
        let ratings_path = ratings_path.as_ref();
        let movie_lines = read_dataset_lines::<Movie>(movies_path, &options.ingestion)?;
        let rating_lines = read_dataset_lines::<Rating>(ratings_path, &options.ingestion)?;
        self.tracked(|| {
            self.analyze_impl(
                &movie_lines,
                Some(movies_path),
                &rating_lines,
                Some(ratings_path),
                options,
            )
        })
        .map(|a| a.report)
    }

    fn analyze_impl<M, R>(
        &self,
        movie_lines: &[M],
        movies_path: Option<&Path>,
        rating_lines: &[R],
        ratings_path: Option<&Path>,
        options: &PipelineOptions,
    ) -> PipelineResult<MovieAnalysis>
    where
        M: AsRef<str> + Sync,
        R: AsRef<str> + Sync,
    {
        options.validate()?;
        let movies: Vec<Movie> = self.parse_impl(movie_lines, movies_path, &options.ingestion)?;
        let ratings: Vec<Rating> = self.parse_impl(rating_lines, ratings_path, &options.ingestion)?;

        let index = MovieIndex::build(&movies, options.duplicate_ids)?;
        let joined = self.join_impl(&index, &ratings);
        let stats = self.aggregate_impl(&joined).to_stats();
        let (top, bottom) = select_extremes(&stats, options.top_k)?;
        let report = build_report(&top, &bottom);

        Ok(MovieAnalysis {
            stats,
            top,
            bottom,
            report,
        })
    }

    fn parse_impl<T, S>(&self, lines: &[S], source: Option<&Path>, options: &IngestionOptions) -> PipelineResult<Vec<T>>
    where
        T: Record,
        S: AsRef<str> + Sync,
    {
        let data = data_lines(lines);
        let stage = match T::DATASET {
            Dataset::Movies => PipelineStage::ParseMovies,
            Dataset::Ratings => PipelineStage::ParseRatings,
        };

        let per_chunk = self.run_chunks(stage, data.len(), |range| {
            let first_line_no = FIRST_DATA_LINE + range.start;
            let parsed = parse_data_lines::<T, S>(
                &data[range],
                first_line_no,
                options.split_strategy,
                options.malformed_lines,
            );
            let produced = parsed.as_ref().map(|p| p.records.len()).unwrap_or(0);
            (parsed, produced)
        });

        // Chunks are in input order, so the first error found is the earliest bad line.
        let merged: PipelineResult<ParsedRecords<T>> = per_chunk
            .into_iter()
            .try_fold(ParsedRecords::default(), |mut acc, chunk| {
                acc.append(chunk?);
                Ok(acc)
            });

        let ctx = IngestionContext {
            dataset: T::DATASET,
            source: source.map(Path::to_path_buf),
        };
        report_outcome(&ctx, options, data.len(), merged)
    }

    fn join_impl(&self, index: &MovieIndex, ratings: &[Rating]) -> Vec<JoinedRating> {
        self.run_chunks(PipelineStage::Join, ratings.len(), |range| {
            let out = crate::processing::join(index, &ratings[range]);
            let n = out.len();
            (out, n)
        })
        .into_iter()
        .flatten()
        .collect()
    }

    fn aggregate_impl(&self, joined: &[JoinedRating]) -> StatsTable {
        self.run_chunks(PipelineStage::Aggregate, joined.len(), |range| {
            let table = aggregate(&joined[range]);
            let n = table.len();
            (table, n)
        })
        .into_iter()
        .fold(StatsTable::new(), StatsTable::merge)
    }

    /// Run `work` over every chunk of `0..row_count` on the pool, returning outputs in chunk order.
    ///
    /// `work` returns the chunk output and its row count for events.
    fn run_chunks<O, F>(&self, stage: PipelineStage, row_count: usize, work: F) -> Vec<O>
    where
        O: Send,
        F: Fn(Range<usize>) -> (O, usize) + Send + Sync,
    {
        let start = Instant::now();
        self.emit(ExecutionEvent::StageStarted {
            stage,
            input_rows: row_count,
        });

        let gate = ChunkGate::new(self.opts.max_in_flight_chunks);
        let ranges = chunk_ranges(row_count, self.opts.chunk_size);

        let per_chunk: Vec<(O, usize)> = self.pool.install(|| {
            ranges
                .into_par_iter()
                .map(|range| {
                    let permit = gate.acquire();
                    if permit.waited > Duration::ZERO {
                        self.metrics.on_throttle_wait(permit.waited);
                        self.emit(ExecutionEvent::ThrottleWaited {
                            stage,
                            duration: permit.waited,
                        });
                    }

                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted {
                        stage,
                        start_row: range.start,
                        row_count: range.len(),
                    });

                    let rows = range.len();
                    let (out, output_rows) = work(range);
                    self.metrics.on_rows_processed(rows);

                    self.emit(ExecutionEvent::ChunkFinished { stage, output_rows });
                    self.metrics.on_chunk_end();
                    drop(permit);
                    (out, output_rows)
                })
                .collect()
        });

        let output_rows = per_chunk.iter().map(|(_, n)| n).sum();
        self.metrics.on_stage_end();
        self.emit(ExecutionEvent::StageFinished {
            stage,
            output_rows,
            elapsed: start.elapsed(),
        });

        per_chunk.into_iter().map(|(out, _)| out).collect()
    }

    /// Wrap one public call in run-level metrics and events.
    fn tracked<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted);

        let out = f();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(row_count))
        .collect()
}
