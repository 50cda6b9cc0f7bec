//! Format loaders.
//!
//! Most callers go through [`crate::execution::DataLoader`]; [`load_file`] (from [`unified`])
//! loads a single file and:
//!
//! - selects the loader by [`crate::config::Suffix`]
//! - folds failures into empty content
//! - reports recoveries, failures and alerts to a [`LoadObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`log`]

pub mod csv;
pub mod log;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, LoadEvent, LoadObserver, LoadSeverity, LoadSummary, Recovery,
    TracingObserver,
};
pub use unified::{load_file, LoadOutcome, LoadRequest, Loaded, LoadedContent};
