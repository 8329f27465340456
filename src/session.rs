// Per-run state passed explicitly to every stage: the cached dataset and
// the filter selections.
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::loader::{load_dataset, FileIdentity, LoadReport};
use crate::reports::{build_dashboard, Dashboard};
use crate::types::Dataset;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug)]
pub struct CachedDataset {
    pub identity: FileIdentity,
    pub dataset: Dataset,
    pub report: LoadReport,
}

/// Holds at most one parsed file. Loading a file with a different identity
/// replaces the entry.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<CachedDataset>,
}

impl DatasetCache {
    pub fn get(&self) -> Option<&CachedDataset> {
        self.entry.as_ref()
    }

    /// Returns the cached entry for `path`, parsing it first if the file's
    /// identity differs from what is cached. The bool is true on a cache hit.
    pub fn load(&mut self, path: &Path, sheet_name: &str) -> Result<(&CachedDataset, bool)> {
        let identity = FileIdentity::of(path)?;
        let (cached, hit) = match self.entry.take() {
            Some(cached) if cached.identity == identity => {
                debug!(path = %path.display(), "dataset cache hit");
                (cached, true)
            }
            previous => match load_dataset(path, sheet_name) {
                Ok((dataset, report)) => (
                    CachedDataset {
                        identity,
                        dataset,
                        report,
                    },
                    false,
                ),
                Err(e) => {
                    self.entry = previous;
                    return Err(e);
                }
            },
        };
        Ok((&*self.entry.insert(cached), hit))
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub config: DashboardConfig,
    cache: DatasetCache,
    /// Widget selections not yet confirmed.
    pub draft: FilterCriteria,
    applied: FilterCriteria,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn dataset(&self) -> Option<&CachedDataset> {
        self.cache.get()
    }

    /// Load (or reuse) a file. A newly parsed file resets all filters.
    pub fn load(&mut self, path: &Path) -> Result<&CachedDataset> {
        let (cached, hit) = self.cache.load(path, &self.config.sheet_name)?;
        if !hit {
            info!(path = %path.display(), "new file loaded; filters reset");
            self.draft = FilterCriteria::default();
            self.applied = FilterCriteria::default();
        }
        Ok(cached)
    }

    pub fn applied(&self) -> &FilterCriteria {
        &self.applied
    }

    /// Confirm the draft as the active criteria.
    pub fn apply(&mut self) {
        self.applied = self.draft.clone();
    }

    pub fn clear(&mut self) {
        self.draft = FilterCriteria::default();
        self.applied = FilterCriteria::default();
    }

    /// The dashboard for the applied criteria, or `None` before any file is loaded.
    pub fn dashboard(&self) -> Option<Dashboard<'_>> {
        let cached = self.cache.get()?;
        Some(build_dashboard(&cached.dataset, &self.applied))
    }
}
