//! `rust-data-loader` discovers per-file datasets under a root directory and loads them into
//! memory in parallel.
//!
//! The primary entrypoint is [`execution::DataLoader`]. It takes a loose dataset/suffix
//! configuration, resolves it into canonical [`config::DatasetDescriptor`]s up front, then
//! discovers and loads every matching file on a worker pool.
//!
//! ## Layout on disk
//!
//! Each dataset kind lives in its own directory under the root, named `<kind>_dataset`:
//!
//! ```text
//! root/
//!   raw_dataset/        **/*.log, **/*.csv
//!   meta_dataset/
//!   processed_dataset/
//! ```
//!
//! ## Formats
//!
//! - **CSV** (`.csv`): headerless, comma-separated, loaded into a [`types::DataSet`] with column
//!   types inferred per column. Rows with one stray trailing comma are repaired and reparsed.
//! - **Log** (`.log`): a list of lines. Files that are not valid UTF-8 are re-read as
//!   windows-1252.
//!
//! A file that cannot be loaded degrades to empty content and is reported to the configured
//! [`ingestion::LoadObserver`]; it never fails the whole load. Configuration errors fail before
//! any file-system access.
//!
//! ## Quick example
//!
//! ```no_run
//! use rust_data_loader::config::{DatasetKind, DatasetSpec, LoaderOptions, Suffix, SuffixSpec};
//! use rust_data_loader::execution::DataLoader;
//!
//! # fn main() -> Result<(), rust_data_loader::LoaderError> {
//! let loader = DataLoader::new(
//!     "/data/cluster",
//!     LoaderOptions {
//!         datasets: Some(DatasetSpec::mapping([
//!             ("raw", SuffixSpec::from(vec![".log", ".csv"])),
//!             ("meta", SuffixSpec::from(".csv")),
//!         ])),
//!         num_threads: Some(8),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let report = loader.load()?;
//! if let Some(raw) = report.get(DatasetKind::Raw) {
//!     for (id, content) in raw.files(Suffix::Log).into_iter().flatten() {
//!         println!("{id}: {} lines", content.as_lines().map_or(0, |l| l.len()));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: dataset/suffix allow-lists, resolution, and loader options
//! - [`discovery`]: recursive file discovery and file identifiers
//! - [`ingestion`]: CSV and log loaders plus observability hooks
//! - [`execution`]: the parallel [`execution::DataLoader`]
//! - [`types`]: in-memory table types
//! - [`error`]: error types

pub mod config;
pub mod discovery;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod types;

pub use error::{ConfigError, LoadError, LoaderError, LoaderResult};
pub use execution::{DataLoader, LoadReport};
