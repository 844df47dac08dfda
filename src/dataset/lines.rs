//! The in-memory line set and its loader.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while building a [`Dataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file {} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read dataset file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The blocking reload task panicked or was cancelled.
    #[error("dataset reload task failed: {0}")]
    Reload(#[from] tokio::task::JoinError),
}

impl DatasetError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => DatasetError::NotFound {
                path: path.to_path_buf(),
            },
            _ => DatasetError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// A set of distinct, trimmed, non-empty lines.
///
/// Membership is exact full-line equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    lines: HashSet<String>,
}

impl Dataset {
    /// Read a UTF-8 text file, one entry per line.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| DatasetError::from_io(path, e))?;

        let mut lines = HashSet::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DatasetError::from_io(path, e))?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.insert(trimmed.to_string());
            }
        }

        Ok(Self { lines })
    }

    /// Exact-match membership test.
    pub fn contains(&self, query: &str) -> bool {
        self.lines.contains(query)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Dataset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let lines = iter
            .into_iter()
            .filter_map(|line| {
                let trimmed = line.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self { lines }
    }
}
