//! Parallel load orchestration.
//!
//! [`DataLoader`] resolves its configuration once at construction, then [`DataLoader::load`]:
//!
//! - discovers files for every `(dataset, suffix)` pair
//! - dispatches one load task per file onto a worker pool owned by the load call
//! - reports a [`LoadEvent::FileLoaded`] progress event as each file completes
//! - counts loaded vs. empty files and reports one [`LoadSummary`] per pair
//!
//! Results are keyed by [`FileId`]; completion order does not matter.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{
    resolve_datasets, DatasetDescriptor, DatasetKind, DatasetRegistry, LoaderConfig, LoaderOptions,
    Suffix,
};
use crate::discovery::{discover_files, DiscoveredFiles, FileLister, GlobLister};
use crate::error::LoaderResult;
use crate::ingestion::{
    load_file, LoadEvent, LoadObserver, LoadRequest, LoadSeverity, LoadSummary, LoadedContent,
    TracingObserver,
};
use crate::types::FileId;

/// Files discovered for one dataset, per suffix.
#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub descriptor: DatasetDescriptor,
    pub files: BTreeMap<Suffix, DiscoveredFiles>,
}

/// Loaded content for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetResult {
    pub descriptor: DatasetDescriptor,
    /// Suffix to `file id -> content`. Suffixes with no discovered files are absent.
    pub data: BTreeMap<Suffix, BTreeMap<FileId, LoadedContent>>,
    /// One entry per loaded suffix.
    pub summaries: Vec<LoadSummary>,
}

impl DatasetResult {
    /// Files loaded for `suffix`, if any were discovered.
    pub fn files(&self, suffix: Suffix) -> Option<&BTreeMap<FileId, LoadedContent>> {
        self.data.get(&suffix)
    }

    /// Content of one file.
    pub fn get(&self, suffix: Suffix, file_id: &FileId) -> Option<&LoadedContent> {
        self.data.get(&suffix).and_then(|files| files.get(file_id))
    }

    /// Summary for `suffix`, if it was loaded.
    pub fn summary(&self, suffix: Suffix) -> Option<&LoadSummary> {
        self.summaries.iter().find(|s| s.suffix == suffix)
    }
}

/// Results of a whole load operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub datasets: Vec<DatasetResult>,
}

impl LoadReport {
    pub fn get(&self, kind: DatasetKind) -> Option<&DatasetResult> {
        self.datasets.iter().find(|d| d.descriptor.kind() == kind)
    }

    /// Files that produced non-empty content, across all datasets.
    pub fn total_loaded(&self) -> usize {
        self.summaries().map(|s| s.loaded).sum()
    }

    /// Files that were empty or failed, across all datasets.
    pub fn total_empty(&self) -> usize {
        self.summaries().map(|s| s.empty).sum()
    }

    fn summaries(&self) -> impl Iterator<Item = &LoadSummary> {
        self.datasets.iter().flat_map(|d| d.summaries.iter())
    }
}

/// Discovers and loads configured datasets under a root directory.
pub struct DataLoader {
    root: PathBuf,
    datasets: DatasetRegistry,
    num_threads: usize,
    observer: Arc<dyn LoadObserver>,
    lister: Arc<dyn FileLister>,
    alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataLoader")
            .field("root", &self.root)
            .field("datasets", &self.datasets)
            .field("num_threads", &self.num_threads)
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl DataLoader {
    /// Resolve `options` into a loader rooted at `root`.
    ///
    /// Fails with a configuration error for unknown datasets or suffixes, wrongly shaped specs,
    /// or a zero worker count. Nothing touches the file system here.
    pub fn new(root: impl Into<PathBuf>, options: LoaderOptions) -> LoaderResult<Self> {
        let observer: Arc<dyn LoadObserver> = options
            .observer
            .clone()
            .unwrap_or_else(|| Arc::new(TracingObserver));
        let num_threads = options.worker_count()?;
        let datasets = resolve_datasets(
            options.datasets.as_ref(),
            options.suffix.as_ref(),
            observer.as_ref(),
        )?;

        Ok(Self {
            root: root.into(),
            datasets,
            num_threads,
            observer,
            lister: options.lister.unwrap_or_else(|| Arc::new(GlobLister)),
            alert_at_or_above: options.alert_at_or_above,
        })
    }

    /// Build a loader from a parsed [`LoaderConfig`].
    pub fn from_config(config: LoaderConfig) -> LoaderResult<Self> {
        let (root, options) = config.into_options();
        Self::new(root, options)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved dataset descriptors.
    pub fn datasets(&self) -> &DatasetRegistry {
        &self.datasets
    }

    /// Size of the worker pool started by [`Self::load`].
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Discover files for every configured `(dataset, suffix)` pair.
    ///
    /// Each call mints new file identifiers.
    pub fn discover(&self) -> LoaderResult<Vec<DatasetFiles>> {
        self.datasets
            .iter()
            .map(|descriptor| -> LoaderResult<DatasetFiles> {
                let dir = self.root.join(descriptor.parent_directory());
                let mut files = BTreeMap::new();
                for suffix in descriptor.suffixes().iter() {
                    let found = discover_files(self.lister.as_ref(), &dir, suffix)?;
                    self.observer.on_event(&LoadEvent::FilesDiscovered {
                        dataset: descriptor.kind(),
                        suffix,
                        files: found.len(),
                    });
                    files.insert(suffix, found);
                }
                Ok(DatasetFiles {
                    descriptor: descriptor.clone(),
                    files,
                })
            })
            .collect()
    }

    /// Discover and load every configured dataset.
    ///
    /// One worker pool is started per call and shared by all datasets and suffixes; it is
    /// joined when this returns. Per-file failures never fail the call.
    pub fn load(&self) -> LoaderResult<LoadReport> {
        let discovered = self.discover()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("data-loader-{i}"))
            .build()?;

        let datasets = discovered
            .into_iter()
            .map(|dataset| self.load_dataset(&pool, dataset))
            .collect();
        Ok(LoadReport { datasets })
    }

    fn load_dataset(&self, pool: &ThreadPool, dataset: DatasetFiles) -> DatasetResult {
        let kind = dataset.descriptor.kind();
        let mut data = BTreeMap::new();
        let mut summaries = Vec::new();

        for (suffix, files) in dataset.files {
            if files.is_empty() {
                continue;
            }
            let (loaded, summary) = self.dispatch(pool, kind, suffix, files);
            self.observer.on_event(&LoadEvent::Summary(summary));
            data.insert(suffix, loaded);
            summaries.push(summary);
        }

        DatasetResult {
            descriptor: dataset.descriptor,
            data,
            summaries,
        }
    }

    fn dispatch(
        &self,
        pool: &ThreadPool,
        dataset: DatasetKind,
        suffix: Suffix,
        files: DiscoveredFiles,
    ) -> (BTreeMap<FileId, LoadedContent>, LoadSummary) {
        let requests: Vec<LoadRequest> = files
            .into_pairs()
            .into_iter()
            .map(|(file_id, path)| LoadRequest { file_id, path, suffix })
            .collect();

        let observer = self.observer.as_ref();
        let alert_at_or_above = self.alert_at_or_above;
        let total = requests.len();
        let completed = AtomicUsize::new(0);
        let outcomes: Vec<_> = pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    let outcome = load_file(request, observer, alert_at_or_above);
                    observer.on_event(&LoadEvent::FileLoaded {
                        dataset,
                        suffix,
                        completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                        total,
                    });
                    (request.file_id, outcome)
                })
                .collect()
        });

        let mut summary = LoadSummary {
            dataset,
            suffix,
            loaded: 0,
            empty: 0,
        };
        let mut loaded = BTreeMap::new();
        for (file_id, outcome) in outcomes {
            if outcome.is_success() {
                summary.loaded += 1;
            } else {
                summary.empty += 1;
            }
            loaded.insert(file_id, outcome.into_content());
        }
        (loaded, summary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use super::DataLoader;
    use crate::config::{DatasetKind, DatasetSpec, LoaderOptions, Suffix, SuffixSpec};
    use crate::ingestion::{LoadEvent, LoadObserver};

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<LoadEvent>>,
    }

    impl LoadObserver for RecordingObserver {
        fn on_event(&self, event: &LoadEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn suffix_without_files_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw_dataset");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("a.log"), "one\ntwo\n").unwrap();

        let obs = Arc::new(RecordingObserver::default());
        let loader = DataLoader::new(
            dir.path(),
            LoaderOptions {
                datasets: Some(DatasetSpec::from("raw")),
                observer: Some(obs.clone()),
                num_threads: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        let report = loader.load().unwrap();
        let raw = report.get(DatasetKind::Raw).unwrap();
        assert!(raw.files(Suffix::Csv).is_none());
        assert_eq!(raw.files(Suffix::Log).unwrap().len(), 1);

        let summaries = obs
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, LoadEvent::Summary(_)))
            .count();
        assert_eq!(summaries, 1);
    }

    #[test]
    fn empty_and_loaded_files_are_counted_separately() {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join("meta_dataset");
        fs::create_dir_all(meta.join("nested")).unwrap();
        fs::write(meta.join("a.csv"), "1,2\n3,4\n").unwrap();
        fs::write(meta.join("nested").join("b.csv"), "x,y\n").unwrap();
        fs::write(meta.join("empty.csv"), "").unwrap();

        let loader = DataLoader::new(
            dir.path(),
            LoaderOptions {
                datasets: Some(DatasetSpec::from("meta")),
                suffix: Some(SuffixSpec::from(".csv")),
                num_threads: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

        let report = loader.load().unwrap();
        let summary = report.get(DatasetKind::Meta).unwrap().summary(Suffix::Csv).unwrap();
        assert_eq!((summary.loaded, summary.empty), (2, 1));
        assert_eq!(report.total_loaded(), 2);
        assert_eq!(report.total_empty(), 1);
    }

    #[test]
    fn each_file_reports_progress_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw_dataset");
        fs::create_dir_all(&raw).unwrap();
        for i in 0..6 {
            fs::write(raw.join(format!("n{i}.log")), "line\n").unwrap();
        }

        let obs = Arc::new(RecordingObserver::default());
        let loader = DataLoader::new(
            dir.path(),
            LoaderOptions {
                datasets: Some(DatasetSpec::from("raw")),
                suffix: Some(SuffixSpec::from(".log")),
                observer: Some(obs.clone()),
                num_threads: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        loader.load().unwrap();

        let mut progress: Vec<(usize, usize)> = obs
            .events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                LoadEvent::FileLoaded {
                    completed, total, ..
                } => Some((*completed, *total)),
                _ => None,
            })
            .collect();
        progress.sort();
        assert_eq!(progress, (1..=6).map(|c| (c, 6)).collect::<Vec<_>>());
    }
}
