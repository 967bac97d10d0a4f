//! Reader bookmarks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved position in a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: Uuid,

    /// 1-based page number
    pub page: u32,

    pub note: String,

    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(page: u32, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page: page.max(1),
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}
