//! Admin catalog commands

use super::open_shelf;
use anyhow::{Context, Result};
use shelf_core::NewBook;
use std::path::Path;

/// Fields `book update` may change
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<u32>,
    pub cover: Option<String>,
    pub stock: Option<u32>,
}

/// Add a book to the catalog
pub async fn book_add(data_dir: &Path, book: NewBook) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    let title = book.title.clone();
    let id = shelf.add_book(book).await?;
    println!("Added '{}' to the catalog as book {}", title, id);
    Ok(())
}

/// Apply `changes` to an existing catalog book
pub async fn book_update(data_dir: &Path, book_id: u64, changes: BookChanges) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    shelf.require_admin()?;

    let mut book = shelf
        .catalog()
        .get(book_id)
        .cloned()
        .with_context(|| format!("No book with id {}", book_id))?;

    if let Some(title) = changes.title {
        book.title = title;
    }
    if let Some(author) = changes.author {
        book.author = author;
    }
    if let Some(pages) = changes.pages {
        book.pages = pages;
    }
    if let Some(cover) = changes.cover {
        book.cover_image = cover;
    }
    if let Some(stock) = changes.stock {
        book.stock = stock;
    }

    let title = book.title.clone();
    shelf.update_book(book).await?;
    println!("Updated book {} ('{}')", book_id, title);
    Ok(())
}

/// Remove a book from the catalog
pub async fn book_delete(data_dir: &Path, book_id: u64) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    let book = shelf.delete_book(book_id).await?;
    println!("Deleted '{}' from the catalog", book.title);
    Ok(())
}
