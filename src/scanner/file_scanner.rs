//! One-shot directory indexer.
//!
//! This module provides the `FileScanner` struct which handles:
//! - Recursive directory walking using walkdir, sorted by file name
//! - Hidden entry filtering (any name starting with `.`)
//! - Media kind detection by file extension
//! - Minting stable file ids through the path registry

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::{GalleryError, Result};
use crate::models::{DirectoryEntry, FileEntry, FileKind, PathRegistry};

/// Configuration for the file scanner.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
}

/// Counters gathered during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub directories: usize,
    pub files: usize,
    pub media_files: usize,
    pub bytes: u64,
}

/// The immutable result of indexing a root directory.
#[derive(Debug, Clone)]
pub struct MediaIndex {
    root: DirectoryEntry,
    registry: Arc<PathRegistry>,
    summary: ScanSummary,
}

impl MediaIndex {
    pub fn root(&self) -> &DirectoryEntry {
        &self.root
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// Looks up a directory by its slash separated path from the root.
    pub fn lookup(&self, path: &str) -> Result<&DirectoryEntry> {
        self.root
            .lookup(path)
            .ok_or_else(|| GalleryError::NotFound(format!("no directory at {path:?}")))
    }
}

pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    /// Creates a new file scanner with default configuration.
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Creates a new file scanner with custom configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Builds the index on a blocking worker thread.
    pub async fn scan_directory(&self, root: &Path) -> Result<MediaIndex> {
        let root = root.to_path_buf();
        let scanner = Self::with_config(self.config.clone());

        task::spawn_blocking(move || scanner.build(&root))
            .await
            .map_err(|e| GalleryError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(format!("scan task panicked: {e}")),
            })?
    }

    /// Walks `root` once and builds the directory tree and path registry.
    ///
    /// Any walk or stat failure aborts the whole build.
    pub fn build(&self, root: &Path) -> Result<MediaIndex> {
        info!("Starting scan of {:?}", root);

        let root = root.canonicalize().map_err(|source| GalleryError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(GalleryError::Io {
                path: root,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "index root is not a directory",
                ),
            });
        }

        let mut registry = PathRegistry::new();
        let mut summary = ScanSummary {
            directories: 1,
            ..Default::default()
        };

        // Open directories from the root down to the current walk position.
        let mut stack = vec![DirectoryEntry::new(display_name(&root))];

        let mut walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if self.config.max_depth > 0 {
            walker = walker.max_depth(self.config.max_depth);
        }

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                GalleryError::Io {
                    path,
                    source: e.into(),
                }
            })?;

            close_directories(&mut stack, entry.depth());

            let metadata = entry.metadata().map_err(|e| GalleryError::Io {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;

            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                trace!(?name, depth = entry.depth(), "Entering directory");
                summary.directories += 1;
                stack.push(DirectoryEntry::new(name));
                continue;
            }

            let kind = FileKind::from_path(entry.path());
            let id = registry.register(entry.path().to_path_buf());
            trace!(%id, ?name, ?kind, "Registered file");

            summary.files += 1;
            summary.bytes += metadata.len();
            if kind.is_media() {
                summary.media_files += 1;
            }

            if let Some(dir) = stack.last_mut() {
                dir.files.push(FileEntry { name, id, kind });
            }
        }

        close_directories(&mut stack, 1);
        let root_entry = stack
            .pop()
            .unwrap_or_else(|| DirectoryEntry::new(display_name(&root)));

        debug!(registered = registry.len(), "Path registry built");
        info!(
            "Scan complete: {} directories, {} files, {} media files, {} bytes",
            summary.directories, summary.files, summary.media_files, summary.bytes
        );

        Ok(MediaIndex {
            root: root_entry,
            registry: Arc::new(registry),
            summary,
        })
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Pops finished directories until the top of the stack is the parent of an
/// entry at `depth`, attaching each one to its parent.
fn close_directories(stack: &mut Vec<DirectoryEntry>, depth: usize) {
    while stack.len() > depth.max(1) {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(done);
            }
        }
    }
}
