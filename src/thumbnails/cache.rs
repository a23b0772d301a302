//! Lazily populated thumbnail cache for video files.
//!
//! - Disk cache: `thumbnail<N>.jpg` files in a flat cache directory, wiped
//!   and recreated on first use
//! - Memory map: file id to cached thumbnail, never evicted
//!
//! Failed generations are remembered as the error thumbnail so a broken file
//! never reaches the transcoder twice.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::gate::{GenerationGate, DEFAULT_MAX_CONCURRENT};
use super::generator::{FfmpegExtractor, FrameExtractor, DEFAULT_FFMPEG, DEFAULT_SEEK_OFFSET};
use crate::error::{GalleryError, Result};
use crate::models::{FileId, PathRegistry};

/// URL prefix under which cache files are served.
pub const CACHE_URL_PREFIX: &str = "/cache/";

/// File name of the image shown for videos whose thumbnail failed.
pub const ERROR_THUMBNAIL: &str = "error.jpg";

/// Size and color of the error thumbnail written when the cache starts.
const ERROR_THUMBNAIL_SIZE: (u32, u32) = (160, 90);
const ERROR_THUMBNAIL_COLOR: [u8; 3] = [64, 64, 64];
const JPEG_QUALITY: u8 = 85;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Configuration for video thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Directory holding generated thumbnails.
    pub cache_dir: PathBuf,
    /// Transcoder executable.
    pub ffmpeg: PathBuf,
    /// Position of the captured frame.
    pub seek_offset: String,
    /// Kill the transcoder after this long (None = wait forever).
    pub timeout: Option<Duration>,
    /// Maximum transcoder processes running at once.
    pub max_concurrent: usize,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            seek_offset: DEFAULT_SEEK_OFFSET.to_string(),
            timeout: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// A cache entry for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedThumbnail {
    /// A frame was extracted into this file of the cache directory.
    Generated { file_name: String },
    /// Generation failed; the error thumbnail stands in.
    Failed,
}

impl CachedThumbnail {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Generated { file_name } => file_name,
            Self::Failed => ERROR_THUMBNAIL,
        }
    }

    /// The `/cache/<name>` URL of this thumbnail.
    pub fn url(&self) -> String {
        format!("{}{}", CACHE_URL_PREFIX, self.file_name())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

type Slot = Arc<Mutex<Option<CachedThumbnail>>>;

/// Video thumbnail cache shared by all requests.
///
/// Each file id has its own slot lock, so a given video is generated at most
/// once. The generation gate bounds how many transcoders run in total.
pub struct ThumbnailCache {
    cache_dir: PathBuf,
    registry: Arc<PathRegistry>,
    extractor: Arc<dyn FrameExtractor>,
    /// None until the first request initializes the cache directory.
    slots: Mutex<Option<HashMap<FileId, Slot>>>,
    next_thumbnail: AtomicUsize,
    gate: GenerationGate,
}

impl ThumbnailCache {
    /// Create a cache that runs ffmpeg as configured.
    pub fn new(config: &ThumbnailConfig, registry: Arc<PathRegistry>) -> Self {
        let extractor = FfmpegExtractor::new(&config.ffmpeg)
            .with_seek_offset(config.seek_offset.clone())
            .with_timeout(config.timeout);
        Self::with_extractor(
            config.cache_dir.clone(),
            registry,
            Arc::new(extractor),
            config.max_concurrent,
        )
    }

    /// Create a cache with a custom frame extractor.
    pub fn with_extractor(
        cache_dir: PathBuf,
        registry: Arc<PathRegistry>,
        extractor: Arc<dyn FrameExtractor>,
        max_concurrent: usize,
    ) -> Self {
        debug!(?cache_dir, max_concurrent, "Created thumbnail cache");
        Self {
            cache_dir,
            registry,
            extractor,
            slots: Mutex::new(None),
            next_thumbnail: AtomicUsize::new(0),
            gate: GenerationGate::new(max_concurrent),
        }
    }

    /// Get the thumbnail of a video, generating it on first request.
    ///
    /// Returns `GenerationError` only for the request that ran the failing
    /// transcoder; later requests for the same id get `CachedThumbnail::Failed`.
    pub fn get_thumbnail(&self, id: FileId) -> Result<CachedThumbnail> {
        let slot = self.slot(id)?;
        let mut entry = slot.lock();

        if let Some(cached) = entry.as_ref() {
            trace!(%id, "Thumbnail cache hit");
            return Ok(cached.clone());
        }

        let video = self.registry.resolve(id)?;
        let _permit = self.gate.acquire();

        let file_name = self.next_file_name();
        let output = self.cache_dir.join(&file_name);
        debug!(%id, ?video, ?output, "Cache miss, generating thumbnail");

        match self.extractor.extract_frame(video, &output) {
            Ok(()) => {
                let cached = CachedThumbnail::Generated { file_name };
                *entry = Some(cached.clone());
                Ok(cached)
            }
            Err(e) => {
                warn!(%id, ?video, error = %e, "Failed to generate thumbnail");
                *entry = Some(CachedThumbnail::Failed);
                Err(GalleryError::Generation {
                    path: video.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Runs `get_thumbnail` on a blocking worker thread.
    pub async fn fetch(self: &Arc<Self>, id: FileId) -> Result<CachedThumbnail> {
        let cache = Arc::clone(self);
        tokio::task::spawn_blocking(move || cache.get_thumbnail(id))
            .await
            .map_err(|e| GalleryError::Generation {
                path: PathBuf::new(),
                reason: format!("thumbnail task panicked: {e}"),
            })?
    }

    /// Finds or creates the slot of `id`, initializing the cache on first use.
    fn slot(&self, id: FileId) -> Result<Slot> {
        let mut slots = self.slots.lock();
        if slots.is_none() {
            reset_cache_dir(&self.cache_dir).map_err(|source| GalleryError::CacheInit {
                dir: self.cache_dir.clone(),
                source,
            })?;
            info!(cache_dir = ?self.cache_dir, "Initialized thumbnail cache");
            *slots = Some(HashMap::new());
        }
        let slots = slots.get_or_insert_with(HashMap::new);

        if let Some(slot) = slots.get(&id) {
            return Ok(Arc::clone(slot));
        }
        // Never create slots for ids the registry does not know.
        self.registry.resolve(id)?;
        Ok(Arc::clone(slots.entry(id).or_default()))
    }

    fn next_file_name(&self) -> String {
        let n = self.next_thumbnail.fetch_add(1, Ordering::Relaxed) + 1;
        format!("thumbnail{n}.jpg")
    }

    /// Whether the cache directory has been initialized.
    pub fn is_ready(&self) -> bool {
        self.slots.lock().is_some()
    }

    /// Get the number of cached entries, including failures.
    pub fn entry_count(&self) -> usize {
        self.slots.lock().as_ref().map_or(0, HashMap::len)
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Remove the cache directory and everything in it, if present.
pub fn purge_cache_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Empty the cache directory and write the error thumbnail into it.
fn reset_cache_dir(dir: &Path) -> std::io::Result<()> {
    purge_cache_dir(dir)?;
    std::fs::create_dir_all(dir)?;
    write_error_thumbnail(&dir.join(ERROR_THUMBNAIL))
}

fn write_error_thumbnail(dst: &Path) -> std::io::Result<()> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};
    use std::fs::File;
    use std::io::{BufWriter, Write};

    let (width, height) = ERROR_THUMBNAIL_SIZE;
    let img = RgbImage::from_pixel(width, height, Rgb(ERROR_THUMBNAIL_COLOR));

    let mut writer = BufWriter::new(File::create(dst)?);
    let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    img.write_with_encoder(encoder).map_err(std::io::Error::other)?;
    writer.flush()?;

    debug!(?dst, "Wrote error thumbnail");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnails::generator::ExtractError;
    use std::fs;
    use std::thread;
    use tempfile::tempdir;

    /// Writes a placeholder file instead of running a transcoder.
    #[derive(Default)]
    struct FakeExtractor {
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FrameExtractor for FakeExtractor {
        fn extract_frame(
            &self,
            _input: &Path,
            output: &Path,
        ) -> std::result::Result<(), ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            self.running.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(ExtractError::Failed {
                    status: "exit status: 1".into(),
                    output: "moov atom not found".into(),
                });
            }
            fs::write(output, b"jpeg").unwrap();
            Ok(())
        }
    }

    fn registry(count: usize) -> Arc<PathRegistry> {
        let mut registry = PathRegistry::new();
        for i in 0..count {
            registry.register(PathBuf::from(format!("/media/clip{i}.mp4")));
        }
        Arc::new(registry)
    }

    fn cache_with(
        dir: &Path,
        extractor: Arc<FakeExtractor>,
        max_concurrent: usize,
    ) -> ThumbnailCache {
        ThumbnailCache::with_extractor(dir.join("cache"), registry(4), extractor, max_concurrent)
    }

    #[test]
    fn test_first_use_resets_cache_dir() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        fs::create_dir(&cache_dir).unwrap();
        fs::write(cache_dir.join("thumbnail9.jpg"), b"stale").unwrap();

        let cache = cache_with(dir.path(), Arc::new(FakeExtractor::default()), 1);
        assert!(!cache.is_ready());

        let thumb = cache.get_thumbnail(FileId::new(0)).unwrap();
        assert!(cache.is_ready());
        assert_eq!(thumb.url(), "/cache/thumbnail1.jpg");
        assert!(cache_dir.join("thumbnail1.jpg").exists());
        assert!(!cache_dir.join("thumbnail9.jpg").exists());
    }

    #[test]
    fn test_first_use_writes_error_thumbnail() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            fail: true,
            ..Default::default()
        });
        let cache = cache_with(dir.path(), extractor, 1);
        assert!(!dir.path().join("cache").join(ERROR_THUMBNAIL).exists());

        cache.get_thumbnail(FileId::new(0)).unwrap_err();
        let failed = cache.get_thumbnail(FileId::new(0)).unwrap();

        let path = cache.cache_dir().join(failed.file_name());
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), ERROR_THUMBNAIL_SIZE.0);
        assert_eq!(img.height(), ERROR_THUMBNAIL_SIZE.1);
    }

    #[test]
    fn test_repeated_requests_hit_cache() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let cache = cache_with(dir.path(), Arc::clone(&extractor), 1);

        let first = cache.get_thumbnail(FileId::new(2)).unwrap();
        let second = cache.get_thumbnail(FileId::new(2)).unwrap();
        assert_eq!(first, second);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_names_increase_per_generation() {
        let dir = tempdir().unwrap();
        let cache = cache_with(dir.path(), Arc::new(FakeExtractor::default()), 1);

        let a = cache.get_thumbnail(FileId::new(3)).unwrap();
        let b = cache.get_thumbnail(FileId::new(0)).unwrap();
        assert_eq!(a.file_name(), "thumbnail1.jpg");
        assert_eq!(b.file_name(), "thumbnail2.jpg");
    }

    #[test]
    fn test_failure_is_cached_as_sentinel() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            fail: true,
            ..Default::default()
        });
        let cache = cache_with(dir.path(), Arc::clone(&extractor), 1);

        let err = cache.get_thumbnail(FileId::new(1)).unwrap_err();
        assert!(matches!(err, GalleryError::Generation { .. }));

        let again = cache.get_thumbnail(FileId::new(1)).unwrap();
        assert!(again.is_failed());
        assert_eq!(again.url(), "/cache/error.jpg");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_id_is_out_of_range() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let cache = cache_with(dir.path(), Arc::clone(&extractor), 1);

        let err = cache.get_thumbnail(FileId::new(4)).unwrap_err();
        assert!(matches!(err, GalleryError::OutOfRange { id: 4 }));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_unwritable_cache_dir_is_init_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let cache = ThumbnailCache::with_extractor(
            blocker.join("cache"),
            registry(1),
            Arc::new(FakeExtractor::default()),
            1,
        );
        let err = cache.get_thumbnail(FileId::new(0)).unwrap_err();
        assert!(matches!(err, GalleryError::CacheInit { .. }));
        assert!(!cache.is_ready());
    }

    #[test]
    fn test_concurrent_requests_generate_once() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let cache = Arc::new(cache_with(dir.path(), Arc::clone(&extractor), 1));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_thumbnail(FileId::new(0)).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.iter().all(|r| r == &results[0]));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generation_is_serialized_by_default() {
        let dir = tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        });
        let cache = Arc::new(cache_with(dir.path(), Arc::clone(&extractor), 1));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_thumbnail(FileId::new(i)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 4);
        assert_eq!(extractor.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_purge_missing_dir_is_ok() {
        let dir = tempdir().unwrap();
        assert!(purge_cache_dir(&dir.path().join("missing")).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_on_blocking_thread() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(cache_with(dir.path(), Arc::new(FakeExtractor::default()), 1));
        let thumb = cache.fetch(FileId::new(1)).await.unwrap();
        assert_eq!(thumb.file_name(), "thumbnail1.jpg");
    }
}
