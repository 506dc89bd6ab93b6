use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::PipelineError;
use crate::types::Dataset;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a skipped line).
    Warning,
    /// Error-level event (the dataset could not be ingested).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl IngestionSeverity {
    /// Severity of a failed ingestion.
    pub fn for_error(e: &PipelineError) -> Self {
        match e {
            PipelineError::Io(_) | PipelineError::Walk(_) => Self::Critical,
            PipelineError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            PipelineError::Pattern(_)
            | PipelineError::Encoding { .. }
            | PipelineError::MalformedLine { .. }
            | PipelineError::ParseError { .. }
            | PipelineError::DuplicateMovieId { .. }
            | PipelineError::InvalidOptions { .. } => Self::Error,
        }
    }
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Dataset being ingested.
    pub dataset: Dataset,
    /// Input path, when the lines came from the file system.
    pub source: Option<PathBuf>,
}

impl IngestionContext {
    fn source_display(&self) -> String {
        match &self.source {
            Some(p) => p.display().to_string(),
            None => "<memory>".to_string(),
        }
    }
}

/// Stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestionStats {
    /// Data lines seen (header excluded).
    pub lines: usize,
    /// Records produced.
    pub records: usize,
    /// Lines dropped under the skip policy.
    pub skipped: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &PipelineError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called once per data line dropped under [`super::MalformedLinePolicy::Skip`].
    fn on_skipped_line(&self, _ctx: &IngestionContext, _line: usize, _error: &PipelineError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_skipped_line(&self, ctx: &IngestionContext, line: usize, error: &PipelineError) {
        for o in &self.observers {
            o.on_skipped_line(ctx, line, error);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!(
            "[ingest][ok] dataset={} source={} lines={} records={} skipped={}",
            ctx.dataset,
            ctx.source_display(),
            stats.lines,
            stats.records,
            stats.skipped
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        eprintln!(
            "[ingest][{:?}] dataset={} source={} err={}",
            severity,
            ctx.dataset,
            ctx.source_display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        eprintln!(
            "[ALERT][ingest][{:?}] dataset={} source={} err={}",
            severity,
            ctx.dataset,
            ctx.source_display(),
            error
        );
    }

    fn on_skipped_line(&self, ctx: &IngestionContext, line: usize, error: &PipelineError) {
        eprintln!(
            "[ingest][skip] dataset={} source={} line={} err={}",
            ctx.dataset,
            ctx.source_display(),
            line,
            error
        );
    }
}

/// Forwards ingestion events to the [`log`] facade under the `ingest` target.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        log::info!(
            target: "ingest",
            "ingested {} from {}: {} records from {} lines ({} skipped)",
            ctx.dataset,
            ctx.source_display(),
            stats.records,
            stats.lines,
            stats.skipped
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        log::error!(
            target: "ingest",
            "{:?}: failed to ingest {} from {}: {}",
            severity,
            ctx.dataset,
            ctx.source_display(),
            error
        );
    }

    fn on_skipped_line(&self, ctx: &IngestionContext, line: usize, error: &PipelineError) {
        log::warn!(
            target: "ingest",
            "skipping {} line {} from {}: {}",
            ctx.dataset,
            line,
            ctx.source_display(),
            error
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok dataset={} source={} records={} skipped={}",
            unix_ts(),
            ctx.dataset,
            ctx.source_display(),
            stats.records,
            stats.skipped
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.append_line(&format!(
            "{} fail severity={:?} dataset={} source={} err={}",
            unix_ts(),
            severity,
            ctx.dataset,
            ctx.source_display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} dataset={} source={} err={}",
            unix_ts(),
            severity,
            ctx.dataset,
            ctx.source_display(),
            error
        ));
    }

    fn on_skipped_line(&self, ctx: &IngestionContext, line: usize, error: &PipelineError) {
        self.append_line(&format!(
            "{} skip dataset={} source={} line={} err={}",
            unix_ts(),
            ctx.dataset,
            ctx.source_display(),
            line,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
