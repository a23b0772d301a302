use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{GalleryError, Result};

/// Stable identifier of an indexed file: its position in the path registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(usize);

impl FileId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<i64> for FileId {
    type Error = GalleryError;

    fn try_from(raw: i64) -> Result<Self> {
        usize::try_from(raw)
            .map(Self)
            .map_err(|_| GalleryError::OutOfRange { id: raw })
    }
}

/// Parses the id segment of a `/img/<id>`, `/video/<id>` or `/slides/<id>` URL.
impl FromStr for FileId {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: i64 = s
            .parse()
            .map_err(|_| GalleryError::NotFound(format!("invalid file id {s:?}")))?;
        Self::try_from(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Other,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" => Self::Image,
            "mp4" | "webm" => Self::Video,
            _ => Self::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    /// Image and video files take part in listings and slide navigation.
    pub fn is_media(self) -> bool {
        self != Self::Other
    }
}

/// A file directly contained in an indexed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub id: FileId,
    pub kind: FileKind,
}

impl FileEntry {
    pub fn is_video(&self) -> bool {
        self.kind == FileKind::Video
    }
}
