use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{DatasetKind, Suffix};
use crate::types::FileId;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (a file degraded to empty content).
    Error,
    /// Critical error (typically I/O failures).
    Critical,
}

/// How a malformed file was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Over-wide CSV rows were fixed by stripping one trailing comma.
    ExtraComma,
    /// A log file was re-read with the legacy single-byte encoding.
    LegacyEncoding,
}

/// Per `(dataset, suffix)` load counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub dataset: DatasetKind,
    pub suffix: Suffix,
    /// Files that produced non-empty content.
    pub loaded: usize,
    /// Files that were empty or failed to load.
    pub empty: usize,
}

/// Events reported while resolving configuration and loading files.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A built-in default was used because the caller supplied nothing.
    DefaultApplied { message: String },
    /// Discovery finished for one `(dataset, suffix)` pair.
    FilesDiscovered {
        dataset: DatasetKind,
        suffix: Suffix,
        files: usize,
    },
    /// A malformed file was loaded after a recovery pass.
    Recovered {
        file_id: FileId,
        path: PathBuf,
        recovery: Recovery,
    },
    /// A file could not be loaded and degraded to empty content.
    Failed {
        file_id: FileId,
        path: PathBuf,
        suffix: Suffix,
        severity: LoadSeverity,
        cause: String,
    },
    /// One file finished loading; `completed` counts files of this pair done so far.
    FileLoaded {
        dataset: DatasetKind,
        suffix: Suffix,
        completed: usize,
        total: usize,
    },
    /// All files for one `(dataset, suffix)` pair were dispatched and collected.
    Summary(LoadSummary),
}

impl LoadEvent {
    /// Severity of this event.
    pub fn severity(&self) -> LoadSeverity {
        match self {
            LoadEvent::DefaultApplied { .. } => LoadSeverity::Warning,
            LoadEvent::Failed { severity, .. } => *severity,
            LoadEvent::FilesDiscovered { .. }
            | LoadEvent::Recovered { .. }
            | LoadEvent::FileLoaded { .. }
            | LoadEvent::Summary(_) => LoadSeverity::Info,
        }
    }
}

impl fmt::Display for LoadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadEvent::DefaultApplied { message } => f.write_str(message),
            LoadEvent::FilesDiscovered { dataset, suffix, files } => write!(
                f,
                "Dataset -> {dataset}. Suffix -> {suffix}. Discovered files -> {files}"
            ),
            LoadEvent::Recovered { path, recovery, .. } => match recovery {
                Recovery::ExtraComma => {
                    write!(f, "CSV file fixed by extra comma: {}", path.display())
                }
                Recovery::LegacyEncoding => write!(
                    f,
                    "LOG file fixed successfully by \"windows-1252\" encoding: {}",
                    path.display()
                ),
            },
            LoadEvent::Failed {
                path, suffix, cause, ..
            } => write!(
                f,
                "Error reading {} file: {} -> {cause}",
                suffix.label(),
                path.display()
            ),
            LoadEvent::FileLoaded {
                dataset,
                suffix,
                completed,
                total,
            } => write!(f, "Dataset -> {dataset}. Suffix -> {suffix}. Loaded {completed}/{total}"),
            LoadEvent::Summary(s) => write!(
                f,
                "Dataset -> {}. Suffix -> {}. Number of complete files -> {}. Number of empty files -> {}",
                s.dataset, s.suffix, s.loaded, s.empty
            ),
        }
    }
}

/// Observer interface for configuration and load events.
///
/// Implementors can record metrics, logs, or trigger alerts. Observers never influence control
/// flow.
pub trait LoadObserver: Send + Sync {
    /// Called for every event.
    fn on_event(&self, event: &LoadEvent);

    /// Called for [`LoadEvent::Failed`] events at or above the configured alert threshold.
    fn on_alert(&self, _event: &LoadEvent) {}
}

/// Forwards events to `tracing` at the matching level.
///
/// This is the default observer. Installing a subscriber is left to the application.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_event(&self, event: &LoadEvent) {
        if let LoadEvent::FileLoaded { .. } = event {
            tracing::debug!("{event}");
            return;
        }
        match event.severity() {
            LoadSeverity::Info => tracing::info!("{event}"),
            LoadSeverity::Warning => tracing::warn!("{event}"),
            LoadSeverity::Error | LoadSeverity::Critical => tracing::error!("{event}"),
        }
    }

    fn on_alert(&self, event: &LoadEvent) {
        tracing::error!(alert = true, "{event}");
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
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

impl LoadObserver for CompositeObserver {
    fn on_event(&self, event: &LoadEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }

    fn on_alert(&self, event: &LoadEvent) {
        for o in &self.observers {
            o.on_alert(event);
        }
    }
}

/// Appends events to a local log file.
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

impl LoadObserver for FileObserver {
    fn on_event(&self, event: &LoadEvent) {
        self.append_line(&format!("{} {:?} {event}", unix_ts(), event.severity()));
    }

    fn on_alert(&self, event: &LoadEvent) {
        self.append_line(&format!("{} ALERT {event}", unix_ts()));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{FileObserver, LoadEvent, LoadObserver, LoadSeverity, LoadSummary, Recovery};
    use crate::config::{DatasetKind, Suffix};
    use crate::types::FileId;

    #[test]
    fn summary_line_names_dataset_suffix_and_counts() {
        let event = LoadEvent::Summary(LoadSummary {
            dataset: DatasetKind::Meta,
            suffix: Suffix::Csv,
            loaded: 3,
            empty: 1,
        });
        assert_eq!(event.severity(), LoadSeverity::Info);
        assert_eq!(
            event.to_string(),
            "Dataset -> meta. Suffix -> .csv. Number of complete files -> 3. Number of empty files -> 1"
        );
    }

    #[test]
    fn failure_severity_is_carried_by_event() {
        let event = LoadEvent::Failed {
            file_id: FileId::new(),
            path: PathBuf::from("x.log"),
            suffix: Suffix::Log,
            severity: LoadSeverity::Critical,
            cause: "gone".to_string(),
        };
        assert_eq!(event.severity(), LoadSeverity::Critical);
        assert_eq!(event.to_string(), "Error reading LOG file: x.log -> gone");
    }

    #[test]
    fn progress_line_shows_completed_of_total() {
        let event = LoadEvent::FileLoaded {
            dataset: DatasetKind::Raw,
            suffix: Suffix::Log,
            completed: 2,
            total: 5,
        };
        assert_eq!(event.severity(), LoadSeverity::Info);
        assert_eq!(event.to_string(), "Dataset -> raw. Suffix -> .log. Loaded 2/5");
    }

    #[test]
    fn file_observer_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.log");
        let obs = FileObserver::new(&log_path);

        obs.on_event(&LoadEvent::Recovered {
            file_id: FileId::new(),
            path: PathBuf::from("a.csv"),
            recovery: Recovery::ExtraComma,
        });
        obs.on_alert(&LoadEvent::DefaultApplied {
            message: "defaulted".to_string(),
        });

        let text = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Info CSV file fixed by extra comma: a.csv"));
        assert!(lines[1].contains("ALERT defaulted"));
    }
}
