//! Suffix allow-list and the suffix normalizer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::{ConfigError, ConfigResult};
use crate::ingestion::{LoadEvent, LoadObserver};

/// Recognized file-format suffix.
///
/// The set is closed: the suffix selects both which files are discovered and which loader runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suffix {
    /// Line-oriented log files (`.log`).
    Log,
    /// Comma-separated tabular files (`.csv`).
    Csv,
}

impl Suffix {
    /// Every allowed suffix.
    pub const ALL: [Suffix; 2] = [Suffix::Log, Suffix::Csv];

    /// Parse a suffix token (case-insensitive, leading dot optional).
    ///
    /// `"tabular"` is accepted as an alias of [`Suffix::Csv`].
    pub fn parse(token: &str) -> ConfigResult<Self> {
        let trimmed = token.trim();
        let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
        match bare.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "csv" | "tabular" => Ok(Self::Csv),
            _ => Err(ConfigError::UnknownSuffix(token.to_string())),
        }
    }

    /// Dotted form, e.g. `.csv`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => ".log",
            Self::Csv => ".csv",
        }
    }

    /// File extension without the dot, e.g. `csv`.
    pub fn extension(&self) -> &'static str {
        &self.as_str()[1..]
    }

    /// Upper-case label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Log => "LOG",
            Self::Csv => "CSV",
        }
    }

    /// `true` if `path` has this suffix's extension (case-insensitive).
    pub fn matches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }
}

impl FromStr for Suffix {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered set of suffixes; duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixSet(Vec<Suffix>);

impl SuffixSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suffix; returns `false` if it was already present.
    pub fn insert(&mut self, suffix: Suffix) -> bool {
        if self.0.contains(&suffix) {
            return false;
        }
        self.0.push(suffix);
        true
    }

    pub fn contains(&self, suffix: Suffix) -> bool {
        self.0.contains(&suffix)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Suffix> + '_ {
        self.0.iter().copied()
    }

    /// Add every suffix of `other` not yet present.
    pub fn extend_from(&mut self, other: &SuffixSet) {
        for s in other.iter() {
            self.insert(s);
        }
    }
}

impl FromIterator<Suffix> for SuffixSet {
    fn from_iter<I: IntoIterator<Item = Suffix>>(iter: I) -> Self {
        let mut set = Self::new();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

impl<const N: usize> From<[Suffix; N]> for SuffixSet {
    fn from(value: [Suffix; N]) -> Self {
        value.into_iter().collect()
    }
}

/// A loose, user-supplied suffix specification: one token or a list of tokens.
///
/// Tokens are validated by [`normalize_suffixes`], not on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixSpec {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SuffixSpec {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for SuffixSpec {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<&str>> for SuffixSpec {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for SuffixSpec {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl TryFrom<JsonValue> for SuffixSpec {
    type Error = ConfigError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(s) => Ok(Self::One(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s),
                    other => Err(suffix_shape_error(&other)),
                })
                .collect::<ConfigResult<Vec<_>>>()
                .map(Self::Many),
            other => Err(suffix_shape_error(&other)),
        }
    }
}

fn suffix_shape_error(found: &JsonValue) -> ConfigError {
    ConfigError::InvalidShape {
        what: "suffix",
        expected: "a string or a list of strings",
        found: json_kind(found).to_string(),
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "a mapping",
    }
}

/// Validate and canonicalize a suffix specification.
///
/// - `spec` absent, `context` absent: reports a [`LoadEvent::DefaultApplied`] warning and
///   returns `{.log}`.
/// - `spec` absent, `context` present: returns `context` (e.g. the union of the suffixes of a
///   dataset mapping).
/// - Any token outside the allow-list fails the whole call; no partial set is returned.
pub fn normalize_suffixes(
    spec: Option<&SuffixSpec>,
    context: Option<&SuffixSet>,
    observer: &dyn LoadObserver,
) -> ConfigResult<SuffixSet> {
    match spec {
        None => match context {
            Some(ctx) => Ok(ctx.clone()),
            None => {
                observer.on_event(&LoadEvent::DefaultApplied {
                    message: format!("No suffix provided, using default for '{}'", Suffix::Log),
                });
                Ok(SuffixSet::from([Suffix::Log]))
            }
        },
        Some(SuffixSpec::One(token)) => Ok(SuffixSet::from([Suffix::parse(token)?])),
        Some(SuffixSpec::Many(tokens)) => tokens.iter().map(|t| Suffix::parse(t)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::{normalize_suffixes, Suffix, SuffixSet, SuffixSpec};
    use crate::error::ConfigError;
    use crate::ingestion::{LoadEvent, LoadObserver};

    struct Silent;

    impl LoadObserver for Silent {
        fn on_event(&self, _event: &LoadEvent) {}
    }

    #[test]
    fn parse_accepts_dotted_bare_and_alias_forms() {
        assert_eq!(Suffix::parse(".csv").unwrap(), Suffix::Csv);
        assert_eq!(Suffix::parse("CSV").unwrap(), Suffix::Csv);
        assert_eq!(Suffix::parse("tabular").unwrap(), Suffix::Csv);
        assert_eq!(Suffix::parse(".LOG").unwrap(), Suffix::Log);
        assert_eq!(
            Suffix::parse(".txt").unwrap_err(),
            ConfigError::UnknownSuffix(".txt".to_string())
        );
    }

    #[test]
    fn matches_path_ignores_extension_case() {
        assert!(Suffix::Csv.matches_path(Path::new("a/b/data.CSV")));
        assert!(!Suffix::Csv.matches_path(Path::new("a/b/data.csv.bak")));
        assert!(!Suffix::Log.matches_path(Path::new("a/b/log")));
    }

    #[test]
    fn duplicates_collapse_and_keep_first_position() {
        let spec = SuffixSpec::from(vec!["csv", ".log", ".CSV"]);
        let set = normalize_suffixes(Some(&spec), None, &Silent).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Suffix::Csv, Suffix::Log]);
    }

    #[test]
    fn contextual_default_is_used_verbatim() {
        let ctx = SuffixSet::from([Suffix::Csv]);
        let set = normalize_suffixes(None, Some(&ctx), &Silent).unwrap();
        assert_eq!(set, ctx);
    }

    #[test]
    fn json_shapes_other_than_string_or_list_are_rejected() {
        assert!(SuffixSpec::try_from(json!(".log")).is_ok());
        assert!(SuffixSpec::try_from(json!([".log", ".csv"])).is_ok());
        for bad in [json!(3), json!(true), json!({"a": ".log"}), json!([".log", 1])] {
            assert!(matches!(
                SuffixSpec::try_from(bad),
                Err(ConfigError::InvalidShape { what: "suffix", .. })
            ));
        }
    }
}
