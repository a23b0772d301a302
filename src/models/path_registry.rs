use std::path::{Path, PathBuf};

use crate::error::{GalleryError, Result};
use crate::models::FileId;

/// Append-only table mapping stable file ids to absolute paths.
///
/// Ids are handed out in registration order and are never reused. The
/// registry is only mutated while the index is being built; afterwards it is
/// shared read-only.
#[derive(Debug, Default, Clone)]
pub struct PathRegistry {
    paths: Vec<PathBuf>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` and returns its newly minted id.
    pub fn register(&mut self, path: PathBuf) -> FileId {
        self.paths.push(path);
        FileId::new(self.paths.len() - 1)
    }

    pub fn resolve(&self, id: FileId) -> Result<&Path> {
        self.paths
            .get(id.index())
            .map(PathBuf::as_path)
            .ok_or(GalleryError::OutOfRange {
                id: i64::try_from(id.index()).unwrap_or(i64::MAX),
            })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, &Path)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, p)| (FileId::new(i), p.as_path()))
    }
}
