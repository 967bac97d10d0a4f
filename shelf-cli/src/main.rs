//! Shelf CLI - Command-line front end for the storefront core

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shelf_core::NewBook;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate a quality argument (0-100)
fn parse_quality(s: &str) -> Result<u8, String> {
    let q: u8 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if q > 100 {
        Err("quality must be between 0 and 100".to_string())
    } else {
        Ok(q)
    }
}

#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the persisted local state
    #[arg(long, global = true, env = "SHELF_DATA_PATH")]
    data_dir: Option<PathBuf>,

    /// Image pipeline configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite an image URL with provider transform parameters
    Qualify {
        /// Image source URL
        source: String,

        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Compression quality (0-100)
        #[arg(short, long, value_parser = parse_quality)]
        quality: Option<u8>,

        /// Remove transform parameters instead of adding them
        #[arg(long, conflicts_with_all = ["width", "height", "quality"])]
        strip: bool,
    },

    /// Show the fallback image assigned to a source
    Fallback {
        /// Image source URL
        source: String,
    },

    /// Simulate loading a book cover through the full pipeline
    Resolve {
        /// Image source URL
        source: String,

        /// Alternative text for the image
        #[arg(long, default_value = "Book cover")]
        alt: String,

        /// Number of times the primary source fails before succeeding
        #[arg(long, default_value = "0")]
        fail: u32,

        /// Make the fallback image fail as well
        #[arg(long)]
        fail_fallback: bool,

        /// Override the retry base delay in milliseconds
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List or search the catalog
    Catalog {
        /// Only show books matching this title, author or tag
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in as a known user
    Login {
        /// Username
        username: String,
    },

    /// Create an account and sign in as it
    Register {
        /// Username
        username: String,

        /// Email address
        #[arg(long)]
        email: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Add a catalog book to your library
    Purchase {
        /// Book id
        book_id: u64,
    },

    /// List the books in your library
    Library {
        /// Remove this book from the library (its bookmarks are kept)
        #[arg(long)]
        remove: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit the catalog (admin only)
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Manage reader bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },

    /// Open a book in the reader
    Read {
        /// Book id
        book_id: u64,

        /// Page to open
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
}

#[derive(Subcommand)]
enum BookAction {
    /// Add a book to the catalog
    Add {
        /// Title
        #[arg(long)]
        title: String,

        /// Author
        #[arg(long)]
        author: String,

        /// Page count
        #[arg(long, default_value = "1")]
        pages: u32,

        /// Cover image URL
        #[arg(long, default_value = "")]
        cover: String,

        /// Genre
        #[arg(long, default_value = "")]
        genre: String,

        /// Short description
        #[arg(long, default_value = "")]
        description: String,

        /// Copies in stock
        #[arg(long, default_value = "10")]
        stock: u32,
    },

    /// Change fields of an existing book
    Update {
        /// Book id
        book_id: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        pages: Option<u32>,

        #[arg(long)]
        cover: Option<String>,

        #[arg(long)]
        stock: Option<u32>,
    },

    /// Remove a book from the catalog, the library and its bookmarks
    Delete {
        /// Book id
        book_id: u64,
    },
}

#[derive(Subcommand)]
enum BookmarkAction {
    /// Bookmark a page
    Add {
        /// Book id
        book_id: u64,

        /// Page number
        page: u32,

        /// Note to attach
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// List bookmarks
    List {
        /// Only show bookmarks for this book
        book_id: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a bookmark
    Remove {
        /// Book id
        book_id: u64,

        /// Bookmark id
        bookmark_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "shelf_cli=debug,shelf_core=debug"
    } else {
        "shelf_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data_dir = commands::resolve_data_dir(cli.data_dir);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Qualify {
            source,
            width,
            height,
            quality,
            strip,
        } => commands::qualify(&source, width, height, quality, strip, config),

        Commands::Fallback { source } => commands::fallback(&source, config),

        Commands::Resolve {
            source,
            alt,
            fail,
            fail_fallback,
            base_delay_ms,
            json,
        } => {
            let options = commands::ResolveOptions {
                alt,
                fail,
                fail_fallback,
                base_delay_ms,
                json,
            };
            commands::resolve(&source, options, config).await
        }

        Commands::Catalog { search, json } => {
            commands::catalog(&data_dir, search.as_deref(), json).await
        }

        Commands::Login { username } => commands::login(&data_dir, &username).await,

        Commands::Register { username, email } => {
            commands::register(&data_dir, &username, &email).await
        }

        Commands::Logout => commands::logout(&data_dir).await,

        Commands::Whoami => commands::whoami(&data_dir).await,

        Commands::Purchase { book_id } => commands::purchase(&data_dir, book_id).await,

        Commands::Library { remove, json } => commands::library(&data_dir, remove, json).await,

        Commands::Book { action } => match action {
            BookAction::Add {
                title,
                author,
                pages,
                cover,
                genre,
                description,
                stock,
            } => {
                let book = NewBook {
                    title,
                    author,
                    cover_image: cover,
                    pages,
                    genre,
                    description,
                    stock,
                    ..NewBook::default()
                };
                commands::book_add(&data_dir, book).await
            }

            BookAction::Update {
                book_id,
                title,
                author,
                pages,
                cover,
                stock,
            } => {
                let changes = commands::BookChanges {
                    title,
                    author,
                    pages,
                    cover,
                    stock,
                };
                commands::book_update(&data_dir, book_id, changes).await
            }

            BookAction::Delete { book_id } => commands::book_delete(&data_dir, book_id).await,
        },

        Commands::Bookmark { action } => match action {
            BookmarkAction::Add {
                book_id,
                page,
                note,
            } => commands::bookmark_add(&data_dir, book_id, page, &note).await,

            BookmarkAction::List { book_id, json } => {
                commands::bookmark_list(&data_dir, book_id, json).await
            }

            BookmarkAction::Remove {
                book_id,
                bookmark_id,
            } => commands::bookmark_remove(&data_dir, book_id, &bookmark_id).await,
        },

        Commands::Read { book_id, page } => commands::read(&data_dir, book_id, page).await,
    }
}
