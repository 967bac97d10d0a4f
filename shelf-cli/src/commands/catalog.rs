//! Catalog command implementation

use super::open_shelf;
use anyhow::Result;
use shelf_core::Book;
use std::path::Path;

/// List or search the catalog
pub async fn catalog(data_dir: &Path, search: Option<&str>, json: bool) -> Result<()> {
    let shelf = open_shelf(data_dir).await?;
    let catalog = shelf.catalog();
    let books: Vec<&Book> = match search {
        Some(query) => catalog.search(query).collect(),
        None => catalog.books().iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books found");
        return Ok(());
    }

    for book in books {
        println!(
            "{:>3}  {}  by {}  ({} pages, {:.1}/5)",
            book.id, book.title, book.author, book.pages, book.rating
        );
    }
    Ok(())
}
