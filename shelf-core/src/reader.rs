//! Simulated paginated reader

use crate::types::{Book, BookId};

/// Reading position within one book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSession {
    book_id: BookId,
    page: u32,
    total: u32,
}

impl ReaderSession {
    /// Open a book at its first page. Books without a page count read as one page.
    pub fn new(book: &Book) -> Self {
        Self {
            book_id: book.id,
            page: 1,
            total: book.pages.max(1),
        }
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// Current 1-based page
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total
    }

    pub fn is_first_page(&self) -> bool {
        self.page == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.page == self.total
    }

    /// Advance one page, stopping at the last
    pub fn next_page(&mut self) -> u32 {
        self.go_to(self.page.saturating_add(1))
    }

    /// Go back one page, stopping at the first
    pub fn prev_page(&mut self) -> u32 {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Jump to `page`, clamped into range
    pub fn go_to(&mut self, page: u32) -> u32 {
        self.page = page.clamp(1, self.total);
        self.page
    }

    /// Fraction of the book read, 0.0 on the first page and 1.0 on the last
    pub fn progress(&self) -> f32 {
        if self.total <= 1 {
            return 1.0;
        }
        (self.page - 1) as f32 / (self.total - 1) as f32
    }

    /// Placeholder text for the current page
    pub fn page_text(&self, book: &Book) -> String {
        format!(
            "Page {} of {}. {} begins: {}",
            self.page, self.total, book.title, book.description
        )
    }
}
