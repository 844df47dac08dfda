//! Dataset lifecycle: cached snapshot or reload-per-query.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dataset::lines::{Dataset, DatasetError};

/// Which lifecycle a [`DatasetStore`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetMode {
    /// Loaded once at startup and shared.
    Cached,
    /// Reloaded from disk for every query.
    Reread,
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetMode::Cached => write!(f, "cached"),
            DatasetMode::Reread => write!(f, "reread"),
        }
    }
}

/// Owner of the queryable line collection.
#[derive(Debug)]
pub enum DatasetStore {
    Cached(Arc<Dataset>),
    Reread { path: PathBuf },
}

impl DatasetStore {
    /// Open the store for `path`.
    ///
    /// In cached mode the file is loaded immediately and any failure is
    /// returned. In reread mode the file is not touched until the first query.
    pub fn open(path: &Path, reread_on_query: bool) -> Result<Self, DatasetError> {
        if reread_on_query {
            tracing::info!(path = %path.display(), "Dataset will be reloaded on every query");
            return Ok(Self::Reread {
                path: path.to_path_buf(),
            });
        }

        let dataset = Dataset::load(path)?;
        tracing::info!(
            path = %path.display(),
            lines = dataset.len(),
            "Dataset loaded and cached"
        );
        Ok(Self::Cached(Arc::new(dataset)))
    }

    pub fn mode(&self) -> DatasetMode {
        match self {
            DatasetStore::Cached(_) => DatasetMode::Cached,
            DatasetStore::Reread { .. } => DatasetMode::Reread,
        }
    }

    /// The dataset view for one query.
    ///
    /// Cached mode hands out the shared snapshot. Reread mode builds a fresh
    /// one on the blocking pool.
    pub async fn snapshot(&self) -> Result<Arc<Dataset>, DatasetError> {
        match self {
            DatasetStore::Cached(dataset) => Ok(Arc::clone(dataset)),
            DatasetStore::Reread { path } => {
                let path = path.clone();
                let dataset = tokio::task::spawn_blocking(move || Dataset::load(&path)).await??;
                Ok(Arc::new(dataset))
            }
        }
    }

    /// Exact-match lookup against the active view.
    pub async fn contains(&self, query: &str) -> Result<bool, DatasetError> {
        Ok(self.snapshot().await?.contains(query))
    }
}
