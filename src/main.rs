use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use serde::Serialize;

use galleryd::models::{DirectoryEntry, FileId};
use galleryd::{Gallery, GalleryConfig};

#[derive(Parser, Debug)]
#[command(name = "galleryd", about = "Index a media tree and inspect its gallery pages")]
struct Cli {
    /// Root of the media tree to index.
    root: PathBuf,

    /// Directory for generated video thumbnails.
    #[arg(long, default_value = "cache", conflicts_with = "xdg_cache")]
    cache_dir: PathBuf,

    /// Keep thumbnails in the platform cache directory instead.
    #[arg(long)]
    xdg_cache: bool,

    /// Frame extractor executable.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Kill the frame extractor after this many seconds.
    #[arg(long)]
    thumbnail_timeout: Option<u64>,

    /// Frame extractors allowed to run at once.
    #[arg(long, default_value_t = 1)]
    max_concurrent: usize,

    /// Media files previewed on a directory page.
    #[arg(long, default_value_t = 10)]
    listing_limit: usize,

    /// Follow symbolic links while indexing.
    #[arg(long)]
    follow_symlinks: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the indexed tree with file ids.
    Tree,
    /// Print the listing page of a directory as JSON.
    List {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print the slide page of a file as JSON.
    Slide {
        id: String,
        #[arg(default_value = "")]
        path: String,
    },
    /// Generate (or look up) the thumbnail of a video.
    Thumbnail { id: String },
    /// Print the content type and size of an indexed file.
    Resource { id: String },
}

impl Cli {
    fn config(&self) -> Result<GalleryConfig> {
        let mut config = GalleryConfig::new(&self.root);
        config.scan.follow_symlinks = self.follow_symlinks;
        config.thumbnails.cache_dir = if self.xdg_cache {
            let dirs = ProjectDirs::from("", "", "galleryd")
                .context("Failed to determine project directories")?;
            dirs.cache_dir().join("thumbs")
        } else {
            self.cache_dir.clone()
        };
        config.thumbnails.ffmpeg = self.ffmpeg.clone();
        config.thumbnails.timeout = self.thumbnail_timeout.map(Duration::from_secs);
        config.thumbnails.max_concurrent = self.max_concurrent;
        config.views.listing_limit = self.listing_limit;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("galleryd=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let gallery = Gallery::open_async(cli.config()?)
        .await
        .with_context(|| format!("Failed to index {:?}", cli.root))?;

    match &cli.command {
        Command::Tree => print_tree(gallery.index().root(), 0),
        Command::List { path } => print_json(&gallery.render_directory_async(path).await?)?,
        Command::Slide { id, path } => {
            print_json(&gallery.render_slide_async(parse_id(id)?, path).await?)?
        }
        Command::Thumbnail { id } => {
            let thumb = gallery.thumbnails().fetch(parse_id(id)?).await?;
            println!("{}", thumb.url());
        }
        Command::Resource { id } => {
            let resource = gallery.read_resource(parse_id(id)?).await?;
            println!(
                "{} {} bytes {}",
                resource.content_type,
                resource.bytes.len(),
                resource.path.display()
            );
        }
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<FileId> {
    raw.parse().with_context(|| format!("Invalid file id {raw:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tree(dir: &DirectoryEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{}/", dir.name);
    for file in &dir.files {
        println!("{indent}  [{}] {} ({:?})", file.id, file.name, file.kind);
    }
    for child in &dir.children {
        print_tree(child, depth + 1);
    }
}
