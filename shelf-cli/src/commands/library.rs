//! Library commands

use super::open_shelf;
use anyhow::{Context, Result};
use std::path::Path;

/// Add a catalog book to the signed-in user's library
pub async fn purchase(data_dir: &Path, book_id: u64) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    shelf.require_user()?;

    let book = shelf
        .catalog()
        .get(book_id)
        .cloned()
        .with_context(|| format!("No book with id {}", book_id))?;

    if shelf.purchase(&book).await? {
        println!("Added '{}' to your library", book.title);
    } else {
        println!("'{}' is already in your library", book.title);
    }
    Ok(())
}

/// List the library, optionally removing a book first
pub async fn library(data_dir: &Path, remove: Option<u64>, json: bool) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    shelf.require_user()?;

    if let Some(id) = remove {
        if shelf.remove_purchase(id).await? {
            tracing::info!("Removed book {} from your library", id);
        } else {
            tracing::warn!("Book {} is not in your library", id);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(shelf.purchases())?);
        return Ok(());
    }

    if shelf.purchases().is_empty() {
        println!("Your library is empty");
        return Ok(());
    }

    for book in shelf.purchases() {
        let marks = shelf.bookmarks_for(book.id).len();
        println!(
            "{:>3}  {}  by {}  ({} bookmarks)",
            book.id, book.title, book.author, marks
        );
    }
    Ok(())
}
