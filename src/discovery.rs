//! Recursive file discovery.
//!
//! The raw directory walk is delegated to a [`FileLister`]; [`discover_files`] filters its output
//! by suffix and mints a fresh [`FileId`] for every file.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::config::Suffix;
use crate::error::LoaderResult;
use crate::types::FileId;

/// File listing primitive: every file under `root` (recursively) whose extension
/// case-insensitively equals `suffix`. Hidden files and directories are skipped.
///
/// A missing `root` is not an error; it simply has no files.
pub trait FileLister: Send + Sync {
    fn list(&self, root: &Path, suffix: Suffix) -> LoaderResult<Vec<PathBuf>>;
}

/// Default [`FileLister`] backed by a case-insensitive `<root>/**/*.<ext>` glob.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobLister;

impl FileLister for GlobLister {
    fn list(&self, root: &Path, suffix: Suffix) -> LoaderResult<Vec<PathBuf>> {
        let base = Pattern::escape(&root.to_string_lossy());
        let pattern = format!("{base}/**/*.{}", suffix.extension());
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut out = Vec::new();
        for entry in glob::glob_with(&pattern, options)? {
            match entry {
                Ok(path) if is_hidden_below(root, &path) => {}
                Ok(path) => out.push(path),
                Err(e) => {
                    tracing::warn!(path = %e.path().display(), "skipping unreadable entry: {e}")
                }
            }
        }
        Ok(out)
    }
}

/// Whether any component of `path` below `root` starts with a dot.
fn is_hidden_below(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).is_ok_and(|rel| {
        rel.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    })
}

/// Files discovered for one `(root, suffix)` pair, keyed by freshly minted identifiers.
///
/// An empty result means "nothing to load for this suffix".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredFiles(BTreeMap<FileId, PathBuf>);

impl DiscoveredFiles {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &Path)> {
        self.0.iter().map(|(id, p)| (id, p.as_path()))
    }

    /// `(id, path)` pairs, ready for dispatch.
    pub fn into_pairs(self) -> Vec<(FileId, PathBuf)> {
        self.0.into_iter().collect()
    }
}

/// Discover files under `root` matching `suffix` and assign each a new [`FileId`].
///
/// Identifiers are minted on every call, so discovering the same path twice yields two
/// different identifiers. Non-files and paths whose extension does not match are dropped even
/// if the lister returned them.
pub fn discover_files(
    lister: &dyn FileLister,
    root: &Path,
    suffix: Suffix,
) -> LoaderResult<DiscoveredFiles> {
    let files = lister
        .list(root, suffix)?
        .into_iter()
        .filter(|p| p.is_file() && suffix.matches_path(p))
        .map(|p| (FileId::new(), p))
        .collect();
    Ok(DiscoveredFiles(files))
}
