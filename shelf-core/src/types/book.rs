//! Catalog book record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog identifier
pub type BookId = u64;

/// A book offered in the storefront
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,

    pub title: String,

    pub author: String,

    /// Cover image source, fed to the image pipeline as-is
    pub cover_image: String,

    pub publisher: String,

    pub publication_date: Option<NaiveDate>,

    /// Page count used by the reader
    pub pages: u32,

    pub description: String,

    pub genre: String,

    /// Average rating, 0-5
    pub rating: f32,

    pub tags: Vec<String>,

    pub stock: u32,
}

impl Book {
    /// Whether `query` (case-insensitive) occurs in the title, author or a tag
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// A book before the catalog has assigned it an id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub cover_image: String,
    pub publisher: String,
    pub publication_date: Option<NaiveDate>,
    pub pages: u32,
    pub description: String,
    pub genre: String,
    pub rating: f32,
    pub tags: Vec<String>,
    pub stock: u32,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_cover(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = cover_image.into();
        self
    }

    /// Attach the catalog id
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            cover_image: self.cover_image,
            publisher: self.publisher,
            publication_date: self.publication_date,
            pages: self.pages,
            description: self.description,
            genre: self.genre,
            rating: self.rating.clamp(0.0, 5.0),
            tags: self.tags,
            stock: self.stock,
        }
    }
}
