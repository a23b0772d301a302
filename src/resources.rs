//! Reading indexed files and cached thumbnails for delivery.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::trace;

use crate::error::{GalleryError, Result};
use crate::models::FileKind;

/// Fallback content type for files that are neither images nor videos.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The bytes of a file plus the content type to serve them with.
#[derive(Debug, Clone)]
pub struct Resource {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Content type derived from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match FileKind::from_extension(ext) {
        FileKind::Video if ext == "webm" => "video/webm",
        FileKind::Video => "video/mp4",
        _ => ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or(OCTET_STREAM),
    }
}

/// Reads the whole file at `path`.
pub async fn read_file(path: &Path) -> Result<Resource> {
    trace!(?path, "Reading resource");
    let bytes = tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            GalleryError::NotFound(path.display().to_string())
        } else {
            GalleryError::Resource {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(Resource {
        path: path.to_path_buf(),
        content_type: content_type(path),
        bytes,
    })
}

/// Checks that `name` names a plain file directly inside the cache directory.
pub fn cache_file_name(name: &str) -> Result<&str> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|n| n == name);
    if plain {
        Ok(name)
    } else {
        Err(GalleryError::NotFound(format!("no cached file {name:?}")))
    }
}
