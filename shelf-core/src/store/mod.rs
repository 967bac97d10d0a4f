//! Persisted per-device state: catalog, accounts, session, purchases and
//! bookmarks
//!
//! Each slice lives under its own storage key and is rewritten in full on
//! every mutation. Loading is opportunistic: a missing slice starts empty,
//! and a slice that fails to parse is discarded rather than failing startup.
//! The catalog and account slices fall back to the demo data instead.

use crate::catalog::{Catalog, Directory};
use crate::error::{CatalogError, Result};
use crate::storage::StorageProvider;
use crate::types::{Book, BookId, Bookmark, NewBook, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Storage key of the catalog, written once an admin edits it
pub const CATALOG_KEY: &str = "catalog.json";

/// Storage key of the account directory, written on registration
pub const USERS_KEY: &str = "users.json";

/// Storage key of the signed-in user
pub const CURRENT_USER_KEY: &str = "current_user.json";

/// Storage key of the purchased books
pub const PURCHASES_KEY: &str = "purchases.json";

/// Storage key of the bookmark map
pub const BOOKMARKS_KEY: &str = "bookmarks.json";

/// Bookmarks grouped by book
pub type BookmarkMap = BTreeMap<BookId, Vec<Bookmark>>;

/// Owner of all persisted local state
pub struct Shelf {
    storage: Arc<dyn StorageProvider>,
    catalog: Catalog,
    directory: Directory,
    current_user: Option<User>,
    purchases: Vec<Book>,
    bookmarks: BookmarkMap,
}

impl Shelf {
    /// Load every slice from `storage`. Never fails.
    pub async fn open(storage: Arc<dyn StorageProvider>) -> Self {
        let catalog = load_slice::<Option<Vec<Book>>>(storage.as_ref(), CATALOG_KEY)
            .await
            .map(Catalog::from_books)
            .unwrap_or_else(Catalog::with_sample_data);
        let directory = load_slice::<Option<Vec<User>>>(storage.as_ref(), USERS_KEY)
            .await
            .map(Directory::from_users)
            .unwrap_or_else(Directory::with_sample_data);
        let current_user = load_slice(storage.as_ref(), CURRENT_USER_KEY).await;
        let purchases = load_slice(storage.as_ref(), PURCHASES_KEY).await;
        let bookmarks = load_slice(storage.as_ref(), BOOKMARKS_KEY).await;

        Self {
            storage,
            catalog,
            directory,
            current_user,
            purchases,
            bookmarks,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// The signed-in user, or `NotSignedIn`
    pub fn require_user(&self) -> Result<&User> {
        self.current_user
            .as_ref()
            .ok_or_else(|| CatalogError::NotSignedIn.into())
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// The signed-in user if they are an administrator
    pub fn require_admin(&self) -> Result<&User> {
        let user = self.require_user()?;
        if !self.is_admin() {
            return Err(CatalogError::NotAdmin.into());
        }
        Ok(user)
    }

    /// Sign in as an existing directory user
    pub async fn login(&mut self, username: &str) -> Result<&User> {
        let user = self
            .directory
            .find(username)
            .cloned()
            .ok_or_else(|| CatalogError::UserNotFound(username.to_string()))?;
        self.sign_in(user).await
    }

    /// Create a regular account and sign in as it
    pub async fn register(&mut self, username: &str, email: &str) -> Result<&User> {
        let mut directory = self.directory.clone();
        let user = directory.register(username, email)?.clone();
        self.save(USERS_KEY, directory.users()).await?;
        self.directory = directory;
        tracing::info!(username = %user.username, id = user.id, "account registered");
        self.sign_in(user).await
    }

    /// Sign out; a no-op when nobody is signed in.
    ///
    /// The session is kept if the stored user cannot be removed.
    pub async fn logout(&mut self) -> Result<()> {
        if self.current_user.is_none() {
            return Ok(());
        }
        match self.storage.delete(CURRENT_USER_KEY).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        self.current_user = None;
        tracing::info!("signed out");
        Ok(())
    }

    async fn sign_in(&mut self, user: User) -> Result<&User> {
        self.save(CURRENT_USER_KEY, &user).await?;
        tracing::info!(username = %user.username, "signed in");
        Ok(self.current_user.insert(user))
    }

    /// Add a book to the catalog (admin only)
    pub async fn add_book(&mut self, book: NewBook) -> Result<BookId> {
        self.require_admin()?;
        let mut catalog = self.catalog.clone();
        let id = catalog.add_book(book)?;
        self.save(CATALOG_KEY, catalog.books()).await?;
        self.catalog = catalog;
        Ok(id)
    }

    /// Replace a catalog book (admin only)
    pub async fn update_book(&mut self, book: Book) -> Result<()> {
        self.require_admin()?;
        let mut catalog = self.catalog.clone();
        catalog.update_book(book)?;
        self.save(CATALOG_KEY, catalog.books()).await?;
        self.catalog = catalog;
        Ok(())
    }

    /// Remove a book from the catalog along with its purchase and bookmarks
    /// (admin only)
    pub async fn delete_book(&mut self, id: BookId) -> Result<Book> {
        self.require_admin()?;
        let mut catalog = self.catalog.clone();
        let book = catalog.delete_book(id)?;
        self.save(CATALOG_KEY, catalog.books()).await?;
        self.catalog = catalog;
        self.forget_book(id).await?;
        Ok(book)
    }

    pub fn purchases(&self) -> &[Book] {
        &self.purchases
    }

    pub fn owns(&self, id: BookId) -> bool {
        self.purchases.iter().any(|b| b.id == id)
    }

    /// Add a book to the library. Returns `false` if it was already there.
    pub async fn purchase(&mut self, book: &Book) -> Result<bool> {
        if self.owns(book.id) {
            tracing::debug!(id = book.id, "book already in library");
            return Ok(false);
        }
        let mut purchases = self.purchases.clone();
        purchases.push(book.clone());
        self.save(PURCHASES_KEY, &purchases).await?;
        self.purchases = purchases;
        Ok(true)
    }

    /// Remove a book from the library. Returns `false` if it was not there.
    pub async fn remove_purchase(&mut self, id: BookId) -> Result<bool> {
        if !self.owns(id) {
            return Ok(false);
        }
        let purchases: Vec<Book> = self
            .purchases
            .iter()
            .filter(|b| b.id != id)
            .cloned()
            .collect();
        self.save(PURCHASES_KEY, &purchases).await?;
        self.purchases = purchases;
        Ok(true)
    }

    pub fn bookmarks(&self) -> &BookmarkMap {
        &self.bookmarks
    }

    /// Bookmarks of one book, ordered by page
    pub fn bookmarks_for(&self, book_id: BookId) -> &[Bookmark] {
        self.bookmarks
            .get(&book_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub async fn add_bookmark(
        &mut self,
        book_id: BookId,
        page: u32,
        note: impl Into<String>,
    ) -> Result<Bookmark> {
        let bookmark = Bookmark::new(page, note);
        let mut bookmarks = self.bookmarks.clone();
        let entry = bookmarks.entry(book_id).or_default();
        entry.push(bookmark.clone());
        entry.sort_by(|a, b| a.page.cmp(&b.page).then(a.created_at.cmp(&b.created_at)));

        self.save(BOOKMARKS_KEY, &bookmarks).await?;
        self.bookmarks = bookmarks;
        Ok(bookmark)
    }

    /// Remove one bookmark. Returns `false` if it did not exist.
    pub async fn remove_bookmark(&mut self, book_id: BookId, bookmark_id: Uuid) -> Result<bool> {
        let mut bookmarks = self.bookmarks.clone();
        let Some(entry) = bookmarks.get_mut(&book_id) else {
            return Ok(false);
        };
        let before = entry.len();
        entry.retain(|b| b.id != bookmark_id);
        if entry.len() == before {
            return Ok(false);
        }
        if entry.is_empty() {
            bookmarks.remove(&book_id);
        }

        self.save(BOOKMARKS_KEY, &bookmarks).await?;
        self.bookmarks = bookmarks;
        Ok(true)
    }

    /// Drop everything held for a book that left the catalog
    pub async fn forget_book(&mut self, book_id: BookId) -> Result<()> {
        self.remove_purchase(book_id).await?;
        if self.bookmarks.contains_key(&book_id) {
            let mut bookmarks = self.bookmarks.clone();
            bookmarks.remove(&book_id);
            self.save(BOOKMARKS_KEY, &bookmarks).await?;
            self.bookmarks = bookmarks;
        }
        Ok(())
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.storage.write(key, data).await?;
        Ok(())
    }
}

/// Read one slice, treating absence and corruption alike as empty
async fn load_slice<T>(storage: &dyn StorageProvider, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let data = match storage.read(key).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => return T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read persisted state, starting empty");
            return T::default();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding malformed persisted state");
            if let Err(e) = storage.delete(key).await {
                tracing::debug!(key, error = %e, "could not remove malformed state");
            }
            T::default()
        }
    }
}
