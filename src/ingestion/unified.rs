//! Per-suffix loader dispatch.
//!
//! [`load_file`] selects the loader for a suffix, reports recoveries and failures to a
//! [`LoadObserver`], and always produces a [`LoadOutcome`]: a file that cannot be loaded
//! degrades to empty content instead of returning an error.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use crate::config::Suffix;
use crate::error::LoadError;
use crate::types::{DataSet, FileId};

use super::observability::{LoadEvent, LoadObserver, LoadSeverity, Recovery};
use super::{csv, log};

/// Content produced by a format loader.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedContent {
    /// Tabular content from a `.csv` file.
    Table(DataSet),
    /// Lines from a `.log` file.
    Lines(Vec<String>),
}

impl LoadedContent {
    /// Empty content of the shape `suffix` produces.
    pub fn empty_for(suffix: Suffix) -> Self {
        match suffix {
            Suffix::Csv => Self::Table(DataSet::empty()),
            Suffix::Log => Self::Lines(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Table(ds) => ds.is_empty(),
            Self::Lines(lines) => lines.is_empty(),
        }
    }

    pub fn as_table(&self) -> Option<&DataSet> {
        match self {
            Self::Table(ds) => Some(ds),
            Self::Lines(_) => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            Self::Lines(lines) => Some(lines),
            Self::Table(_) => None,
        }
    }
}

/// Result of loading one file. Failures are already folded into [`LoadOutcome::Empty`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The file produced non-empty content.
    Success(LoadedContent),
    /// The file was empty or could not be loaded.
    Empty(LoadedContent),
}

impl LoadOutcome {
    fn from_content(content: LoadedContent) -> Self {
        if content.is_empty() {
            Self::Empty(content)
        } else {
            Self::Success(content)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn content(&self) -> &LoadedContent {
        match self {
            Self::Success(c) | Self::Empty(c) => c,
        }
    }

    pub fn into_content(self) -> LoadedContent {
        match self {
            Self::Success(c) | Self::Empty(c) => c,
        }
    }
}

/// Loader output plus the recovery pass that produced it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub content: T,
    pub recovery: Option<Recovery>,
}

impl<T> Loaded<T> {
    pub fn clean(content: T) -> Self {
        Self {
            content,
            recovery: None,
        }
    }

    pub fn recovered(content: T, recovery: Recovery) -> Self {
        Self {
            content,
            recovery: Some(recovery),
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            content: f(self.content),
            recovery: self.recovery,
        }
    }
}

/// One file to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub file_id: FileId,
    pub path: PathBuf,
    pub suffix: Suffix,
}

/// Load one file with the loader selected by `suffix`.
///
/// Reports to `observer`:
///
/// - [`LoadEvent::Recovered`] when a recovery pass was needed
/// - [`LoadEvent::Failed`] when loading failed (the outcome is then empty content)
/// - `on_alert` for failures whose severity is `>= alert_at_or_above`
///
/// An empty CSV file is an expected condition: it yields empty content and no event.
pub fn load_file(
    request: &LoadRequest,
    observer: &dyn LoadObserver,
    alert_at_or_above: LoadSeverity,
) -> LoadOutcome {
    let path = request.path.as_path();
    let result = match request.suffix {
        Suffix::Csv => csv::load_csv_from_path(path).map(|l| l.map(LoadedContent::Table)),
        Suffix::Log => log::load_log_from_path(path).map(|l| l.map(LoadedContent::Lines)),
    };

    match result {
        Ok(loaded) => {
            if let Some(recovery) = loaded.recovery {
                observer.on_event(&LoadEvent::Recovered {
                    file_id: request.file_id,
                    path: request.path.clone(),
                    recovery,
                });
            }
            LoadOutcome::from_content(loaded.content)
        }
        Err(LoadError::EmptyInput) => LoadOutcome::Empty(LoadedContent::empty_for(request.suffix)),
        Err(e) => {
            report_failure(request, path, &e, observer, alert_at_or_above);
            LoadOutcome::Empty(LoadedContent::empty_for(request.suffix))
        }
    }
}

fn report_failure(
    request: &LoadRequest,
    path: &Path,
    error: &LoadError,
    observer: &dyn LoadObserver,
    alert_at_or_above: LoadSeverity,
) {
    let severity = severity_for_error(error);
    let event = LoadEvent::Failed {
        file_id: request.file_id,
        path: path.to_path_buf(),
        suffix: request.suffix,
        severity,
        cause: error.to_string(),
    };
    observer.on_event(&event);
    if severity >= alert_at_or_above {
        observer.on_alert(&event);
    }
}

fn severity_for_error(e: &LoadError) -> LoadSeverity {
    match e {
        LoadError::Io(_) => LoadSeverity::Critical,
        LoadError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => LoadSeverity::Critical,
            _ if error_chain_contains_io(err) => LoadSeverity::Critical,
            _ => LoadSeverity::Error,
        },
        LoadError::Utf8(_) | LoadError::RaggedRow { .. } | LoadError::EmptyInput => {
            LoadSeverity::Error
        }
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{severity_for_error, LoadedContent, LoadOutcome};
    use crate::config::Suffix;
    use crate::error::LoadError;
    use crate::ingestion::LoadSeverity;

    #[test]
    fn io_errors_are_critical_parse_errors_are_not() {
        let io = LoadError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_for_error(&io), LoadSeverity::Critical);
        let ragged = LoadError::RaggedRow {
            line: 3,
            expected: 2,
            found: 4,
        };
        assert_eq!(severity_for_error(&ragged), LoadSeverity::Error);
    }

    #[test]
    fn empty_content_matches_suffix_shape() {
        assert!(LoadedContent::empty_for(Suffix::Csv).as_table().is_some());
        assert_eq!(LoadedContent::empty_for(Suffix::Log).as_lines(), Some(&[][..]));
    }

    #[test]
    fn outcome_is_success_only_for_non_empty_content() {
        let lines = LoadedContent::Lines(vec!["x".to_string()]);
        assert!(LoadOutcome::from_content(lines).is_success());
        assert!(!LoadOutcome::from_content(LoadedContent::Lines(Vec::new())).is_success());
    }
}
