//! Dataset allow-list and the dataset resolver.
//!
//! [`resolve_datasets`] turns a loose [`DatasetSpec`] (absent, one name, several names, or a
//! mapping of name to suffixes) into a [`DatasetRegistry`] of immutable
//! [`DatasetDescriptor`]s keyed by [`DatasetKind`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::{ConfigError, ConfigResult};
use crate::ingestion::{LoadEvent, LoadObserver};

use super::suffix::{json_kind, normalize_suffixes, Suffix, SuffixSet, SuffixSpec};

/// Known dataset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetKind {
    Raw,
    Meta,
    Processed,
}

impl DatasetKind {
    /// Every allowed dataset kind.
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Raw, DatasetKind::Meta, DatasetKind::Processed];

    /// Dataset used when the caller configures none.
    pub const DEFAULT: DatasetKind = DatasetKind::Raw;

    /// Parse a dataset name (exact match).
    pub fn parse(name: &str) -> ConfigResult<Self> {
        match name {
            "raw" => Ok(Self::Raw),
            "meta" => Ok(Self::Meta),
            "processed" => Ok(Self::Processed),
            _ => Err(ConfigError::UnknownDataset(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Meta => "meta",
            Self::Processed => "processed",
        }
    }

    /// Directory (relative to the load root) holding this dataset's files: `<name>_dataset`.
    pub fn parent_directory(&self) -> PathBuf {
        PathBuf::from(format!("{}_dataset", self.as_str()))
    }
}

impl FromStr for DatasetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    kind: DatasetKind,
    parent_directory: PathBuf,
    suffixes: SuffixSet,
}

impl DatasetDescriptor {
    /// Create a descriptor; the parent directory is derived from `kind`.
    pub fn new(kind: DatasetKind, suffixes: SuffixSet) -> Self {
        Self {
            kind,
            parent_directory: kind.parent_directory(),
            suffixes,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn parent_directory(&self) -> &Path {
        &self.parent_directory
    }

    pub fn suffixes(&self) -> &SuffixSet {
        &self.suffixes
    }
}

/// A loose, user-supplied dataset specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSpec {
    /// A single dataset name; suffixes come from the global suffix spec.
    One(String),
    /// Several dataset names sharing the global suffix spec.
    Many(Vec<String>),
    /// Dataset name to its own suffix spec.
    Mapping(Vec<(String, SuffixSpec)>),
}

impl DatasetSpec {
    /// Build a mapping spec from `(name, suffix spec)` pairs.
    pub fn mapping<N, S, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<SuffixSpec>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect(),
        )
    }
}

impl From<&str> for DatasetSpec {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<&str>> for DatasetSpec {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(str::to_string).collect())
    }
}

impl TryFrom<JsonValue> for DatasetSpec {
    type Error = ConfigError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(s) => Ok(Self::One(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s),
                    other => Err(dataset_shape_error(&other)),
                })
                .collect::<ConfigResult<Vec<_>>>()
                .map(Self::Many),
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(name, suffix)| Ok((name, SuffixSpec::try_from(suffix)?)))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Self::Mapping),
            other => Err(dataset_shape_error(&other)),
        }
    }
}

fn dataset_shape_error(found: &JsonValue) -> ConfigError {
    ConfigError::InvalidShape {
        what: "datasets",
        expected: "a string, a list of strings or a mapping of name to suffixes",
        found: json_kind(found).to_string(),
    }
}

/// Canonical set of dataset descriptors produced by [`resolve_datasets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRegistry {
    descriptors: Vec<DatasetDescriptor>,
    suffixes: SuffixSet,
}

impl DatasetRegistry {
    /// Look up the descriptor for `kind`.
    pub fn get(&self, kind: DatasetKind) -> Option<&DatasetDescriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }

    /// Descriptors in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.descriptors.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.descriptors.iter().map(|d| d.kind)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The resolved global suffix set.
    pub fn suffixes(&self) -> &SuffixSet {
        &self.suffixes
    }

    fn push(&mut self, descriptor: DatasetDescriptor) {
        if self.get(descriptor.kind).is_none() {
            self.descriptors.push(descriptor);
        }
    }
}

/// Resolve a dataset specification and a global suffix specification into descriptors.
///
/// All validation happens here, before any file-system access. Any invalid name or suffix fails
/// the whole call.
pub fn resolve_datasets(
    datasets: Option<&DatasetSpec>,
    suffix: Option<&SuffixSpec>,
    observer: &dyn LoadObserver,
) -> ConfigResult<DatasetRegistry> {
    let mut registry = DatasetRegistry {
        descriptors: Vec::new(),
        suffixes: SuffixSet::new(),
    };

    match datasets {
        None => {
            observer.on_event(&LoadEvent::DefaultApplied {
                message: format!(
                    "No datasets provided, using default for '{}'",
                    DatasetKind::DEFAULT
                ),
            });
            // The default dataset always loads `.log`; a supplied suffix spec is only validated.
            normalize_suffixes(suffix, None, observer)?;
            if suffix.is_some() {
                observer.on_event(&LoadEvent::DefaultApplied {
                    message: format!(
                        "Suffix ignored for default dataset '{}', using '{}'",
                        DatasetKind::DEFAULT,
                        Suffix::Log
                    ),
                });
            }
            let suffixes = SuffixSet::from([Suffix::Log]);
            registry.suffixes = suffixes.clone();
            registry.push(DatasetDescriptor::new(DatasetKind::DEFAULT, suffixes));
        }
        Some(DatasetSpec::One(name)) => {
            let kind = DatasetKind::parse(name)?;
            let suffixes = shared_suffixes(suffix, observer)?;
            registry.suffixes = suffixes.clone();
            registry.push(DatasetDescriptor::new(kind, suffixes));
        }
        Some(DatasetSpec::Many(names)) => {
            let kinds = names
                .iter()
                .map(|n| DatasetKind::parse(n))
                .collect::<ConfigResult<Vec<_>>>()?;
            let suffixes = shared_suffixes(suffix, observer)?;
            registry.suffixes = suffixes.clone();
            for kind in kinds {
                registry.push(DatasetDescriptor::new(kind, suffixes.clone()));
            }
        }
        Some(DatasetSpec::Mapping(entries)) => {
            let mut union = SuffixSet::new();
            let mut descriptors = Vec::with_capacity(entries.len());
            for (name, spec) in entries {
                let kind = DatasetKind::parse(name)?;
                let suffixes = normalize_suffixes(Some(spec), None, observer)?;
                union.extend_from(&suffixes);
                descriptors.push(DatasetDescriptor::new(kind, suffixes));
            }
            registry.suffixes = normalize_suffixes(suffix, Some(&union), observer)?;
            for d in descriptors {
                registry.push(d);
            }
        }
    }

    Ok(registry)
}

/// Suffixes shared by every name of a single/list spec: the global spec, or both suffixes.
fn shared_suffixes(
    suffix: Option<&SuffixSpec>,
    observer: &dyn LoadObserver,
) -> ConfigResult<SuffixSet> {
    match suffix {
        Some(spec) => normalize_suffixes(Some(spec), None, observer),
        None => Ok(SuffixSet::from([Suffix::Log, Suffix::Csv])),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::{resolve_datasets, DatasetKind, DatasetSpec};
    use crate::config::{Suffix, SuffixSpec};
    use crate::error::ConfigError;
    use crate::ingestion::{LoadEvent, LoadObserver};

    struct Silent;

    impl LoadObserver for Silent {
        fn on_event(&self, _event: &LoadEvent) {}
    }

    #[test]
    fn parent_directory_follows_name() {
        for kind in DatasetKind::ALL {
            let reg =
                resolve_datasets(Some(&DatasetSpec::from(kind.as_str())), None, &Silent).unwrap();
            let d = reg.get(kind).unwrap();
            assert_eq!(d.parent_directory(), Path::new(&format!("{}_dataset", kind.as_str())));
        }
    }

    #[test]
    fn single_name_without_suffix_gets_both_suffixes() {
        let reg = resolve_datasets(Some(&DatasetSpec::from("meta")), None, &Silent).unwrap();
        let d = reg.get(DatasetKind::Meta).unwrap();
        assert_eq!(d.suffixes().iter().collect::<Vec<_>>(), vec![Suffix::Log, Suffix::Csv]);
    }

    #[test]
    fn list_is_all_or_nothing() {
        let spec = DatasetSpec::from(vec!["raw", "bogus", "meta"]);
        let err = resolve_datasets(Some(&spec), None, &Silent).unwrap_err();
        assert_eq!(err, ConfigError::UnknownDataset("bogus".to_string()));
    }

    #[test]
    fn duplicate_names_collapse() {
        let spec = DatasetSpec::from(vec!["raw", "raw"]);
        let reg = resolve_datasets(Some(&spec), Some(&SuffixSpec::from(".csv")), &Silent).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn mapping_global_suffix_defaults_to_union() {
        let spec = DatasetSpec::mapping([
            ("raw", SuffixSpec::from(".log")),
            ("meta", SuffixSpec::from(".csv")),
        ]);
        let reg = resolve_datasets(Some(&spec), None, &Silent).unwrap();
        assert_eq!(reg.suffixes().len(), 2);
        assert!(reg.suffixes().contains(Suffix::Log));
        assert!(reg.suffixes().contains(Suffix::Csv));
    }

    #[test]
    fn json_mapping_converts_per_key() {
        let spec =
            DatasetSpec::try_from(json!({"raw": ["log", "tabular"], "meta": "tabular"})).unwrap();
        let reg = resolve_datasets(Some(&spec), None, &Silent).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(DatasetKind::Raw).unwrap().suffixes().len(), 2);
        assert_eq!(reg.get(DatasetKind::Meta).unwrap().suffixes().len(), 1);
    }

    #[test]
    fn json_number_is_invalid_shape() {
        assert!(matches!(
            DatasetSpec::try_from(json!(42)),
            Err(ConfigError::InvalidShape { what: "datasets", .. })
        ));
        assert!(matches!(
            DatasetSpec::try_from(json!({"raw": 1})),
            Err(ConfigError::InvalidShape { what: "suffix", .. })
        ));
    }
}
