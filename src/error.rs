use thiserror::Error;

/// Convenience result type for configuration resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience result type for a single file load attempt.
pub type LoadResult<T> = Result<T, LoadError>;

/// Convenience result type for top-level loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Invalid dataset/suffix configuration.
///
/// Always raised synchronously, before any file-system access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The dataset name is not one of the known dataset kinds.
    #[error("dataset '{0}' not allowed")]
    UnknownDataset(String),

    /// The suffix is not one of the known suffixes.
    #[error("suffix '{0}' not allowed")]
    UnknownSuffix(String),

    /// A dataset or suffix value has the wrong shape (e.g. a number where a name was expected).
    #[error("{what} must be {expected}, got {found}")]
    InvalidShape {
        what: &'static str,
        expected: &'static str,
        found: String,
    },

    /// The worker count override is zero.
    #[error("number of workers must be > 0")]
    InvalidWorkerCount,
}

/// Error raised while loading a single file.
///
/// These never escape a loader: they are reported to the observer and the file degrades to
/// empty content.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O error (file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The file is not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A row has more fields than the first row of the file.
    #[error("expected {expected} fields in line {line}, saw {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The file has no data at all.
    #[error("no columns to parse from file")]
    EmptyInput,
}

/// Error type returned by [`crate::execution::DataLoader`] and config-file loading.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Invalid dataset/suffix configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The discovery pattern built from the root directory is invalid.
    #[error("invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON (or has the wrong shape).
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}
