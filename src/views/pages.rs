//! View models for the directory listing and slide pages.
//!
//! These are the data handed to the template renderer. Only image and video
//! files appear; video thumbnails go through the thumbnail cache.

use serde::Serialize;
use tracing::warn;

use super::urls::{directory_url, image_url, resource_url, slide_url};
use crate::error::{GalleryError, Result};
use crate::models::{DirectoryEntry, FileEntry, FileId, FileKind};
use crate::navigation;
use crate::thumbnails::ThumbnailCache;

/// Default number of files previewed on a directory page.
pub const DEFAULT_LISTING_LIMIT: usize = 10;

/// Configuration for rendered pages.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Maximum media files shown on a directory page.
    pub listing_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            listing_limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCard {
    pub name: String,
    /// Slide view of this file.
    pub url: String,
    pub resource_url: String,
    /// None when a video thumbnail could not be produced for this request.
    pub thumbnail_url: Option<String>,
    pub is_video: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryView {
    pub name: String,
    pub directories: Vec<DirectoryLink>,
    pub files: Vec<FileCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideView {
    pub name: String,
    pub is_video: bool,
    pub resource_url: String,
    pub prev_url: String,
    pub next_url: String,
    /// Thumbnail strip around the current file.
    pub others: Vec<FileCard>,
}

/// Builds the listing page of `directory`, reached at `base_path`.
pub fn render_directory(
    directory: &DirectoryEntry,
    base_path: &str,
    thumbnails: &ThumbnailCache,
    config: &ViewConfig,
) -> DirectoryView {
    let directories = directory
        .children
        .iter()
        .map(|child| DirectoryLink {
            name: child.name.clone(),
            url: directory_url(base_path, &child.name),
        })
        .collect();

    let files = directory
        .media_files()
        .into_iter()
        .take(config.listing_limit)
        .filter_map(|file| file_card(file, base_path, thumbnails))
        .collect();

    DirectoryView {
        name: directory.name.clone(),
        directories,
        files,
    }
}

/// Builds the slide page of file `id` inside `directory`.
pub fn render_slide(
    directory: &DirectoryEntry,
    base_path: &str,
    id: FileId,
    thumbnails: &ThumbnailCache,
) -> Result<SlideView> {
    let files = directory.media_files();
    let siblings = navigation::siblings(&files, id).ok_or_else(|| {
        GalleryError::NotFound(format!("file {id} is not in directory {:?}", directory.name))
    })?;

    let current = siblings.current;
    let others = navigation::neighborhood(&files, siblings.index)
        .iter()
        .filter_map(|file| file_card(file, base_path, thumbnails))
        .collect();

    Ok(SlideView {
        name: current.name.clone(),
        is_video: current.is_video(),
        resource_url: resource_url(current).unwrap_or_else(|| image_url(current.id)),
        prev_url: slide_url(base_path, siblings.prev.id),
        next_url: slide_url(base_path, siblings.next.id),
        others,
    })
}

fn file_card(file: &FileEntry, base_path: &str, thumbnails: &ThumbnailCache) -> Option<FileCard> {
    let resource_url = resource_url(file)?;
    let thumbnail_url = match file.kind {
        FileKind::Image => Some(image_url(file.id)),
        FileKind::Video => match thumbnails.get_thumbnail(file.id) {
            Ok(thumb) => Some(thumb.url()),
            Err(e) => {
                warn!(id = %file.id, error = %e, "Rendering video without thumbnail");
                None
            }
        },
        FileKind::Other => return None,
    };

    Some(FileCard {
        name: file.name.clone(),
        url: slide_url(base_path, file.id),
        resource_url,
        thumbnail_url,
        is_video: file.is_video(),
    })
}
