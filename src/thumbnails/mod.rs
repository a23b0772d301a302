//! Thumbnail pipeline for video files.
//!
//! This module provides:
//! - `ThumbnailCache` - Lazily populated id to thumbnail mapping
//! - `FrameExtractor` - Capability that writes one video frame to disk
//! - `GenerationGate` - Bound on concurrent transcoder processes

pub mod cache;
pub mod gate;
pub mod generator;

pub use cache::{purge_cache_dir, CachedThumbnail, ThumbnailCache, ThumbnailConfig};
pub use gate::GenerationGate;
pub use generator::{ExtractError, FfmpegExtractor, FrameExtractor};
