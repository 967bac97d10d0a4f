//! Shelf Core Library
//!
//! This crate provides the storefront's core logic: the image display
//! pipeline used for book covers, the catalog and user directory, the
//! persisted per-device state (session, purchases, bookmarks) and the
//! simulated reader.

pub mod catalog;
pub mod config;
pub mod error;
pub mod image;
pub mod reader;
pub mod storage;
pub mod store;
pub mod types;

pub use catalog::{Catalog, Directory};
pub use config::PipelineConfig;
pub use error::{CatalogError, LoadError, Result, ShelfError, StorageError};
pub use image::{ImagePipeline, ImageRequest, ImageSlot, PipelineContext, Resolution, Tier};
pub use reader::ReaderSession;
pub use store::Shelf;
pub use types::{Book, BookId, Bookmark, NewBook, User};
