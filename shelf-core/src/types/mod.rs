//! Core types for the storefront

mod book;
mod bookmark;
mod user;

pub use book::{Book, BookId, NewBook};
pub use bookmark::Bookmark;
pub use user::User;
