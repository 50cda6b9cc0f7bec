//! Configuration resolution.
//!
//! Loose, user-supplied dataset and suffix specifications are normalized into a
//! [`DatasetRegistry`] before any file-system access:
//!
//! - [`suffix`]: the suffix allow-list and [`normalize_suffixes`]
//! - [`dataset`]: the dataset allow-list and [`resolve_datasets`]
//! - [`options`]: runtime [`LoaderOptions`] and the JSON-backed [`LoaderConfig`]

pub mod dataset;
pub mod options;
pub mod suffix;

pub use dataset::{resolve_datasets, DatasetDescriptor, DatasetKind, DatasetRegistry, DatasetSpec};
pub use options::{LoaderConfig, LoaderOptions};
pub use suffix::{normalize_suffixes, Suffix, SuffixSet, SuffixSpec};
