//! Read command implementation

use super::open_shelf;
use anyhow::{Context, Result};
use shelf_core::ReaderSession;
use std::path::Path;

/// Show one page of a book along with its bookmarks
pub async fn read(data_dir: &Path, book_id: u64, page: u32) -> Result<()> {
    let shelf = open_shelf(data_dir).await?;
    let book = shelf
        .catalog()
        .get(book_id)
        .with_context(|| format!("No book with id {}", book_id))?;

    if !shelf.owns(book_id) {
        tracing::info!("'{}' is not in your library, showing a preview", book.title);
    }

    let mut reader = ReaderSession::new(book);
    let shown = reader.go_to(page);
    if shown != page {
        tracing::debug!(requested = page, shown, "page clamped into range");
    }

    println!("{}", book.title);
    println!();
    println!("{}", reader.page_text(book));
    println!();
    println!(
        "Page {}/{}  ({:.0}%)",
        reader.page(),
        reader.total_pages(),
        reader.progress() * 100.0
    );

    for bookmark in shelf
        .bookmarks_for(book_id)
        .iter()
        .filter(|b| b.page == reader.page())
    {
        if bookmark.note.is_empty() {
            println!("Bookmarked");
        } else {
            println!("Bookmarked: {}", bookmark.note);
        }
    }
    Ok(())
}
