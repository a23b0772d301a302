//! Data handed to the HTTP and template layer.

pub mod pages;
pub mod urls;

pub use pages::{
    render_directory, render_slide, DirectoryLink, DirectoryView, FileCard, SlideView, ViewConfig,
};
