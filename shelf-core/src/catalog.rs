//! Catalog and user directory
//!
//! Both are plain owned values: views receive them by reference and every
//! mutation goes through a method here.

use crate::error::CatalogError;
use crate::types::{Book, BookId, NewBook, User};
use chrono::NaiveDate;

/// The storefront's book list
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    /// Catalog seeded with the demo titles
    pub fn with_sample_data() -> Self {
        Self {
            books: sample_books(),
        }
    }

    /// Catalog restored from a persisted book list
    pub fn from_books(books: Vec<Book>) -> Self {
        Self { books }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// The first `n` books, as shown on the home page carousel
    pub fn featured(&self, n: usize) -> &[Book] {
        &self.books[..n.min(self.books.len())]
    }

    /// Books whose title, author or tags contain `query`
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Book> + 'a {
        self.books.iter().filter(move |b| b.matches(query))
    }

    /// Add a book at the front of the list, returning its new id
    pub fn add_book(&mut self, book: NewBook) -> Result<BookId, CatalogError> {
        if book.title.trim().is_empty() {
            return Err(CatalogError::MissingField("title".to_string()));
        }
        if book.author.trim().is_empty() {
            return Err(CatalogError::MissingField("author".to_string()));
        }

        let id = self.books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        tracing::info!(id, title = %book.title, "book added to catalog");
        self.books.insert(0, book.into_book(id));
        Ok(id)
    }

    /// Replace the book with the same id
    pub fn update_book(&mut self, book: Book) -> Result<(), CatalogError> {
        let slot = self
            .books
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or(CatalogError::BookNotFound(book.id))?;
        *slot = book;
        Ok(())
    }

    /// Remove a book, returning it
    pub fn delete_book(&mut self, id: BookId) -> Result<Book, CatalogError> {
        let idx = self
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or(CatalogError::BookNotFound(id))?;
        tracing::info!(id, "book deleted from catalog");
        Ok(self.books.remove(idx))
    }
}

/// Mock account directory backing the login and registration screens
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<User>,
}

impl Directory {
    pub fn with_sample_data() -> Self {
        Self {
            users: sample_users(),
        }
    }

    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Exact username lookup
    pub fn find(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Register a regular (non-admin) account
    pub fn register(&mut self, username: &str, email: &str) -> Result<&User, CatalogError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CatalogError::MissingField("username".to_string()));
        }
        if !email.contains('@') {
            return Err(CatalogError::MissingField("email".to_string()));
        }
        if self.find(username).is_some() {
            return Err(CatalogError::UsernameTaken(username.to_string()));
        }

        let id = self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        self.users.push(User {
            id,
            username: username.to_string(),
            email: email.trim().to_string(),
            avatar: format!("https://i.pravatar.cc/150?u={}", urlencoding::encode(username)),
            is_admin: false,
        });
        Ok(&self.users[self.users.len() - 1])
    }
}

fn sample_books() -> Vec<Book> {
    let book = |id: BookId,
                title: &str,
                author: &str,
                cover: &str,
                publisher: &str,
                date: (i32, u32, u32),
                pages: u32,
                description: &str,
                genre: &str,
                rating: f32,
                tags: &[&str]| Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        cover_image: cover.to_string(),
        publisher: publisher.to_string(),
        publication_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        pages,
        description: description.to_string(),
        genre: genre.to_string(),
        rating,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        stock: 10,
    };

    vec![
        book(
            1,
            "The Midnight Library",
            "Matt Haig",
            "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=800&q=80",
            "Influential",
            (2021, 4, 28),
            400,
            "Between life and death there is a library, and in it a second chance.",
            "Fiction",
            4.5,
            &["fantasy", "healing"],
        ),
        book(
            2,
            "The Dallergut Dream Department Store",
            "Lee Mi-ye",
            "https://images.unsplash.com/photo-1593349349909-478631b2d39d?w=800&q=80",
            "Factory Nine",
            (2020, 7, 8),
            304,
            "A shop you can only enter while asleep, selling the most popular dreams.",
            "Fiction",
            4.7,
            &["fantasy", "coming-of-age"],
        ),
        book(
            3,
            "Almond",
            "Sohn Won-pyung",
            "https://images.unsplash.com/photo-1512820790803-83ca734da794?w=800&q=80",
            "Changbi",
            (2017, 3, 31),
            264,
            "A boy who cannot feel emotions learns what it means to be human.",
            "Fiction",
            4.6,
            &["coming-of-age"],
        ),
        book(
            4,
            "Cosmos",
            "Carl Sagan",
            "https://images.unsplash.com/photo-1446776811953-b23d57bd21aa?w=800&q=80",
            "Science Books",
            (2006, 12, 20),
            720,
            "A personal voyage through the universe and our place in it.",
            "Science",
            4.8,
            &["science", "classic"],
        ),
    ]
}

fn sample_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            avatar: "https://i.pravatar.cc/150?u=reader".to_string(),
            is_admin: false,
        },
        User {
            id: 2,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            avatar: "https://i.pravatar.cc/150?u=admin".to_string(),
            is_admin: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let catalog = Catalog::with_sample_data();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.featured(2).len(), 2);
        assert_eq!(catalog.featured(50).len(), 4);
        assert_eq!(catalog.get(1).unwrap().title, "The Midnight Library");
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::with_sample_data();
        let ids: Vec<_> = catalog.search("FANTASY").map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(catalog.search("sagan").count(), 1);
        assert_eq!(catalog.search("").count(), 4);
    }

    #[test]
    fn test_add_update_delete() {
        let mut catalog = Catalog::with_sample_data();

        let id = catalog
            .add_book(NewBook::new("Pachinko", "Min Jin Lee").with_pages(496))
            .unwrap();
        assert_eq!(id, 5);
        assert_eq!(catalog.books()[0].id, 5);

        let mut book = catalog.get(id).unwrap().clone();
        book.stock = 3;
        catalog.update_book(book).unwrap();
        assert_eq!(catalog.get(id).unwrap().stock, 3);

        assert_eq!(catalog.delete_book(id).unwrap().title, "Pachinko");
        assert_eq!(catalog.delete_book(id), Err(CatalogError::BookNotFound(id)));
    }

    #[test]
    fn test_add_requires_title() {
        let mut catalog = Catalog::with_sample_data();
        assert_eq!(
            catalog.add_book(NewBook::new(" ", "Someone")),
            Err(CatalogError::MissingField("title".to_string()))
        );
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_register() {
        let mut directory = Directory::with_sample_data();
        assert!(directory.find("admin").unwrap().is_admin);

        let user = directory.register("bookworm", "worm@example.com").unwrap();
        assert_eq!(user.id, 3);
        assert!(!user.is_admin);

        assert_eq!(
            directory.register("bookworm", "again@example.com").unwrap_err(),
            CatalogError::UsernameTaken("bookworm".to_string())
        );
        assert!(directory.register("", "x@example.com").is_err());
        assert!(directory.register("nomail", "nomail").is_err());
    }
}
