//! CLI command implementations

mod book;
mod bookmark;
mod catalog;
mod image;
mod library;
mod read;
mod session;

pub use book::{book_add, book_delete, book_update, BookChanges};
pub use bookmark::{bookmark_add, bookmark_list, bookmark_remove};
pub use catalog::catalog;
pub use image::{fallback, qualify, resolve, ResolveOptions};
pub use library::{library, purchase};
pub use read::read;
pub use session::{login, logout, register, whoami};

use anyhow::{Context, Result};
use shelf_core::storage::LocalStorage;
use shelf_core::{PipelineConfig, PipelineContext, Shelf};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pick the data directory: the explicit flag (or `SHELF_DATA_PATH`, which
/// clap folds into it), else the platform data dir
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "shelf", "Shelf") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        // Fallback to current directory
        PathBuf::from("shelf_data")
    }
}

/// Open the persisted state under `data_dir`
async fn open_shelf(data_dir: &Path) -> Result<Shelf> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    tracing::debug!("Using data directory {}", data_dir.display());

    Ok(Shelf::open(Arc::new(LocalStorage::new(data_dir))).await)
}

/// Build the pipeline context from an optional config file
fn pipeline_context(config: Option<&Path>) -> Result<PipelineContext> {
    let config = match config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    PipelineContext::from_config(&config).context("Invalid pipeline configuration")
}
