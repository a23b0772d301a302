//! The gallery: a built index plus the thumbnail cache, ready to serve pages.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{GalleryError, Result};
use crate::models::FileId;
use crate::resources::{self, Resource};
use crate::scanner::{FileScanner, MediaIndex, ScanConfig};
use crate::thumbnails::{
    purge_cache_dir, CachedThumbnail, FrameExtractor, ThumbnailCache, ThumbnailConfig,
};
use crate::views::{self, DirectoryView, SlideView, ViewConfig};

/// Everything needed to start a gallery.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Root of the indexed media tree.
    pub root: PathBuf,
    pub scan: ScanConfig,
    pub thumbnails: ThumbnailConfig,
    pub views: ViewConfig,
}

impl GalleryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scan: ScanConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            views: ViewConfig::default(),
        }
    }
}

pub struct Gallery {
    index: Arc<MediaIndex>,
    thumbnails: Arc<ThumbnailCache>,
    views: ViewConfig,
}

impl Gallery {
    /// Clears leftover thumbnails and indexes the media tree.
    ///
    /// Indexing errors are returned as-is; no partial gallery is ever built.
    pub fn open(config: GalleryConfig) -> Result<Self> {
        Self::clear_cache(&config);
        let index = FileScanner::with_config(config.scan.clone()).build(&config.root)?;
        Ok(Self::assemble(config, index, None))
    }

    /// Like `open`, but indexes on a blocking worker thread.
    pub async fn open_async(config: GalleryConfig) -> Result<Self> {
        Self::clear_cache(&config);
        let index = FileScanner::with_config(config.scan.clone())
            .scan_directory(&config.root)
            .await?;
        Ok(Self::assemble(config, index, None))
    }

    /// Like `open`, with a custom frame extractor for video thumbnails.
    pub fn with_extractor(
        config: GalleryConfig,
        extractor: Arc<dyn FrameExtractor>,
    ) -> Result<Self> {
        Self::clear_cache(&config);
        let index = FileScanner::with_config(config.scan.clone()).build(&config.root)?;
        Ok(Self::assemble(config, index, Some(extractor)))
    }

    fn clear_cache(config: &GalleryConfig) {
        let dir = &config.thumbnails.cache_dir;
        if let Err(e) = purge_cache_dir(dir) {
            warn!(?dir, error = ?e, "Failed to clear thumbnail cache");
        }
    }

    fn assemble(
        config: GalleryConfig,
        index: MediaIndex,
        extractor: Option<Arc<dyn FrameExtractor>>,
    ) -> Self {
        let registry = Arc::clone(index.registry());
        let thumbnails = match extractor {
            Some(extractor) => ThumbnailCache::with_extractor(
                config.thumbnails.cache_dir.clone(),
                registry,
                extractor,
                config.thumbnails.max_concurrent,
            ),
            None => ThumbnailCache::new(&config.thumbnails, registry),
        };

        let summary = index.summary();
        info!(
            root = ?config.root,
            files = summary.files,
            media_files = summary.media_files,
            bytes = summary.bytes,
            "Gallery ready"
        );

        Self {
            index: Arc::new(index),
            thumbnails: Arc::new(thumbnails),
            views: config.views,
        }
    }

    pub fn index(&self) -> &MediaIndex {
        &self.index
    }

    pub fn thumbnails(&self) -> &Arc<ThumbnailCache> {
        &self.thumbnails
    }

    /// Listing page of the directory at `path`.
    ///
    /// Runs the transcoder inline for uncached videos; async callers use
    /// `render_directory_async`.
    pub fn render_directory_at(&self, path: &str) -> Result<DirectoryView> {
        let directory = self.index.lookup(path)?;
        Ok(views::render_directory(
            directory,
            path,
            &self.thumbnails,
            &self.views,
        ))
    }

    /// Slide page of file `id` within the directory at `path`.
    pub fn render_slide_at(&self, id: FileId, path: &str) -> Result<SlideView> {
        let directory = self.index.lookup(path)?;
        views::render_slide(directory, path, id, &self.thumbnails)
    }

    /// Runs `render_directory_at` on a blocking worker thread.
    pub async fn render_directory_async(&self, path: &str) -> Result<DirectoryView> {
        let index = Arc::clone(&self.index);
        let thumbnails = Arc::clone(&self.thumbnails);
        let config = self.views.clone();
        let path = path.to_owned();

        tokio::task::spawn_blocking(move || {
            let directory = index.lookup(&path)?;
            Ok(views::render_directory(directory, &path, &thumbnails, &config))
        })
        .await
        .map_err(render_panicked)?
    }

    /// Runs `render_slide_at` on a blocking worker thread.
    pub async fn render_slide_async(&self, id: FileId, path: &str) -> Result<SlideView> {
        let index = Arc::clone(&self.index);
        let thumbnails = Arc::clone(&self.thumbnails);
        let path = path.to_owned();

        tokio::task::spawn_blocking(move || {
            let directory = index.lookup(&path)?;
            views::render_slide(directory, &path, id, &thumbnails)
        })
        .await
        .map_err(render_panicked)?
    }

    pub fn thumbnail(&self, id: FileId) -> Result<CachedThumbnail> {
        self.thumbnails.get_thumbnail(id)
    }

    /// Bytes of the indexed file `id`.
    pub async fn read_resource(&self, id: FileId) -> Result<Resource> {
        let path = self.index.registry().resolve(id)?.to_path_buf();
        resources::read_file(&path).await
    }

    /// Bytes of a generated thumbnail served under `/cache/<name>`.
    pub async fn read_cached_thumbnail(&self, name: &str) -> Result<Resource> {
        let name = resources::cache_file_name(name)?;
        resources::read_file(&self.thumbnails.cache_dir().join(name)).await
    }
}

fn render_panicked(e: tokio::task::JoinError) -> GalleryError {
    GalleryError::Generation {
        path: PathBuf::new(),
        reason: format!("render task panicked: {e}"),
    }
}
