//! Media gallery core: a one-shot directory index with stable file ids,
//! a lazily populated video thumbnail cache, and slide navigation.

pub mod error;
pub mod gallery;
pub mod models;
pub mod navigation;
pub mod resources;
pub mod scanner;
pub mod thumbnails;
pub mod views;

pub use error::{GalleryError, Result};
pub use gallery::{Gallery, GalleryConfig};
