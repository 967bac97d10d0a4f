//! Bookmark commands

use super::open_shelf;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use shelf_core::{BookId, Bookmark, ReaderSession};
use std::path::Path;
use uuid::Uuid;

/// Bookmark listing output
#[derive(Serialize)]
struct BookmarkEntry<'a> {
    book_id: BookId,
    #[serde(flatten)]
    bookmark: &'a Bookmark,
}

/// Bookmark a page of a catalog book
pub async fn bookmark_add(data_dir: &Path, book_id: u64, page: u32, note: &str) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    let book = shelf
        .catalog()
        .get(book_id)
        .cloned()
        .with_context(|| format!("No book with id {}", book_id))?;

    let mut reader = ReaderSession::new(&book);
    if reader.go_to(page) != page {
        bail!(
            "Page {} is out of range for '{}' (1-{})",
            page,
            book.title,
            reader.total_pages()
        );
    }

    let bookmark = shelf.add_bookmark(book_id, page, note).await?;
    println!("Bookmarked page {} of '{}' ({})", page, book.title, bookmark.id);
    Ok(())
}

/// List bookmarks, for one book or all of them
pub async fn bookmark_list(data_dir: &Path, book_id: Option<u64>, json: bool) -> Result<()> {
    let shelf = open_shelf(data_dir).await?;

    let entries: Vec<BookmarkEntry> = shelf
        .bookmarks()
        .iter()
        .filter(|(id, _)| book_id.map_or(true, |wanted| **id == wanted))
        .flat_map(|(id, marks)| {
            marks.iter().map(move |bookmark| BookmarkEntry {
                book_id: *id,
                bookmark,
            })
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No bookmarks");
        return Ok(());
    }

    for entry in entries {
        let b = entry.bookmark;
        if b.note.is_empty() {
            println!("{}  book {} page {}", b.id, entry.book_id, b.page);
        } else {
            println!("{}  book {} page {}  {}", b.id, entry.book_id, b.page, b.note);
        }
    }
    Ok(())
}

/// Remove a bookmark by id
pub async fn bookmark_remove(data_dir: &Path, book_id: u64, bookmark_id: &str) -> Result<()> {
    let id = Uuid::parse_str(bookmark_id)
        .with_context(|| format!("Invalid bookmark id: {}", bookmark_id))?;

    let mut shelf = open_shelf(data_dir).await?;
    if !shelf.remove_bookmark(book_id, id).await? {
        bail!("No bookmark {} on book {}", id, book_id);
    }
    println!("Removed bookmark {}", id);
    Ok(())
}
