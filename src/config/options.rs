use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::discovery::FileLister;
use crate::error::{ConfigError, LoaderResult};
use crate::ingestion::{LoadObserver, LoadSeverity};

use super::dataset::DatasetSpec;
use super::suffix::SuffixSpec;

/// Options controlling a [`crate::execution::DataLoader`].
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoaderOptions {
    /// Dataset specification. If `None`, the default dataset is loaded.
    pub datasets: Option<DatasetSpec>,
    /// Global suffix specification.
    pub suffix: Option<SuffixSpec>,
    /// Number of worker threads. If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Observer for logging/alerts. If `None`, events go to `tracing`.
    pub observer: Option<Arc<dyn LoadObserver>>,
    /// File listing primitive. If `None`, a glob-based recursive lister is used.
    pub lister: Option<Arc<dyn FileLister>>,
    /// Severity threshold at which `on_alert` is invoked for failed files.
    pub alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("datasets", &self.datasets)
            .field("suffix", &self.suffix)
            .field("num_threads", &self.num_threads)
            .field("observer_set", &self.observer.is_some())
            .field("lister_set", &self.lister.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            datasets: None,
            suffix: None,
            num_threads: None,
            observer: None,
            lister: None,
            alert_at_or_above: LoadSeverity::Critical,
        }
    }
}

impl LoaderOptions {
    /// Number of workers to start, validated.
    pub fn worker_count(&self) -> Result<usize, ConfigError> {
        match self.num_threads {
            Some(0) => Err(ConfigError::InvalidWorkerCount),
            Some(n) => Ok(n),
            None => Ok(std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLoaderConfig {
    root: PathBuf,
    #[serde(default)]
    datasets: Option<JsonValue>,
    #[serde(default)]
    suffix: Option<JsonValue>,
    #[serde(default)]
    n_jobs: Option<usize>,
}

/// File-backed loader configuration.
///
/// ```json
/// {
///   "root": "/data/cluster",
///   "datasets": {"raw": [".log", ".csv"], "meta": ".csv"},
///   "n_jobs": 8
/// }
/// ```
///
/// `datasets` and `suffix` accept the same shapes as [`DatasetSpec`] and [`SuffixSpec`];
/// anything else is a [`ConfigError::InvalidShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub root: PathBuf,
    pub datasets: Option<DatasetSpec>,
    pub suffix: Option<SuffixSpec>,
    pub n_jobs: Option<usize>,
}

impl LoaderConfig {
    /// Parse a JSON config document.
    pub fn from_json_str(input: &str) -> LoaderResult<Self> {
        let raw: RawLoaderConfig = serde_json::from_str(input)?;
        Ok(Self {
            root: raw.root,
            datasets: raw.datasets.map(DatasetSpec::try_from).transpose()?,
            suffix: raw.suffix.map(SuffixSpec::try_from).transpose()?,
            n_jobs: raw.n_jobs,
        })
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Split into the load root and [`LoaderOptions`] (observer and lister left at defaults).
    pub fn into_options(self) -> (PathBuf, LoaderOptions) {
        (
            self.root,
            LoaderOptions {
                datasets: self.datasets,
                suffix: self.suffix,
                num_threads: self.n_jobs,
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{LoaderConfig, LoaderOptions};
    use crate::config::{DatasetSpec, SuffixSpec};
    use crate::error::{ConfigError, LoaderError};

    #[test]
    fn parses_full_config() {
        let cfg = LoaderConfig::from_json_str(
            r#"{"root": "/data", "datasets": ["raw", "meta"], "suffix": ".csv", "n_jobs": 2}"#,
        )
        .unwrap();
        assert_eq!(cfg.datasets, Some(DatasetSpec::from(vec!["raw", "meta"])));
        assert_eq!(cfg.suffix, Some(SuffixSpec::from(".csv")));

        let (root, opts) = cfg.into_options();
        assert_eq!(root.to_str(), Some("/data"));
        assert_eq!(opts.num_threads, Some(2));
    }

    #[test]
    fn null_fields_are_absent() {
        let cfg =
            LoaderConfig::from_json_str(r#"{"root": ".", "datasets": null, "suffix": null}"#)
                .unwrap();
        assert!(cfg.datasets.is_none());
        assert!(cfg.suffix.is_none());
    }

    #[test]
    fn wrong_shape_is_a_configuration_error() {
        let err = LoaderConfig::from_json_str(r#"{"root": ".", "datasets": 7}"#).unwrap_err();
        assert!(matches!(err, LoaderError::Config(ConfigError::InvalidShape { .. })));
    }

    #[test]
    fn zero_workers_rejected() {
        let opts = LoaderOptions {
            num_threads: Some(0),
            ..Default::default()
        };
        assert_eq!(opts.worker_count(), Err(ConfigError::InvalidWorkerCount));
        assert!(LoaderOptions::default().worker_count().unwrap() >= 1);
    }
}
