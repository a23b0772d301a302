//! URL scheme shared with the HTTP layer.

use crate::models::{FileEntry, FileId, FileKind};

pub const FILES_PREFIX: &str = "/files/";
pub const SLIDES_PREFIX: &str = "/slides/";
pub const IMAGE_PREFIX: &str = "/img/";
pub const VIDEO_PREFIX: &str = "/video/";

/// Listing URL of the child directory `name` of the directory at `base_path`.
pub fn directory_url(base_path: &str, name: &str) -> String {
    match base_path.trim_matches('/') {
        "" => format!("{FILES_PREFIX}{name}"),
        base => format!("{FILES_PREFIX}{base}/{name}"),
    }
}

/// Slide view URL of file `id` in the directory at `base_path`.
pub fn slide_url(base_path: &str, id: FileId) -> String {
    match base_path.trim_matches('/') {
        "" => format!("{SLIDES_PREFIX}{id}"),
        base => format!("{SLIDES_PREFIX}{id}/{base}"),
    }
}

pub fn image_url(id: FileId) -> String {
    format!("{IMAGE_PREFIX}{id}")
}

pub fn video_url(id: FileId) -> String {
    format!("{VIDEO_PREFIX}{id}")
}

/// Full resolution URL of a media file; `Other` files have none.
pub fn resource_url(file: &FileEntry) -> Option<String> {
    match file.kind {
        FileKind::Image => Some(image_url(file.id)),
        FileKind::Video => Some(video_url(file.id)),
        FileKind::Other => None,
    }
}
