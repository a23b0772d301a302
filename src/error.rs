//! Error taxonomy for the gallery core.

use std::path::PathBuf;

/// Errors produced while indexing, rendering, or generating thumbnails.
///
/// `Io` is only produced by the index build and is fatal at startup. The
/// other variants are per-request failures the caller turns into an error
/// response.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// A file id outside the registered range.
    #[error("invalid file id {id}")]
    OutOfRange { id: i64 },

    /// No directory or file matches the requested path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem walk or stat failure during indexing.
    #[error("failed to index {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The thumbnail cache directory could not be recreated.
    #[error("failed to initialize thumbnail cache at {dir:?}: {source}")]
    CacheInit {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The frame extractor failed for a video.
    #[error("thumbnail generation failed for {path:?}: {reason}")]
    Generation { path: PathBuf, reason: String },

    /// A registered resource could not be read for serving.
    #[error("failed to read {path:?}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GalleryError {
    /// Whether this error should be reported as a missing page rather than a
    /// server failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::NotFound(_))
    }
}

pub type Result<T, E = GalleryError> = std::result::Result<T, E>;
