//! # Basic Usage Example
//!
//! This example walks through the controller façade:
//! - Defining models with the `#[model]` macro and a has-many relation
//! - Create, read, update, upsert, archive and delete
//! - Filtering, ordering, eager loading and pagination
//!
//! It uses a SQLite file so it runs without a database server. Set `DB_TYPE`
//! and the other `DB_*` variables to point it somewhere else.

use recordhaus::prelude::*;
use recordhaus::store_object::DbPool;

#[model]
#[table(name = "authors")]
pub struct Author {
    #[primary_key]
    pub id: i64,

    #[field(unique)]
    pub email: String,

    pub name: String,

    #[relation(has_many, foreign_key = "author_id")]
    pub books: Option<Vec<Book>>,
}

#[model]
#[table(name = "books")]
pub struct Book {
    #[primary_key]
    pub id: i64,

    pub title: String,

    pub published: NaiveDate,

    pub author_id: i64,

    #[relation(belongs_to, foreign_key = "author_id")]
    pub author: Option<Box<Author>>,
}

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        published DATE NOT NULL,
        author_id INTEGER NOT NULL REFERENCES authors(id),
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT 0
    )",
    "DELETE FROM books",
    "DELETE FROM authors",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("recordhaus basic usage");
    println!("======================");

    let config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(_)) => DatabaseConfig::sqlite("recordhaus_demo"),
        Err(e) => return Err(e.into()),
    };
    let engine = Engine::connect(config).await?;
    engine.health_check().await?;
    println!("connected: {}", engine.config().connection_string());

    match engine.store().pool() {
        DbPool::Sqlite(pool) => {
            for statement in SQLITE_SCHEMA {
                sqlx::query(statement).execute(pool).await?;
            }
        }
        _ => println!("expecting the authors and books tables to exist already"),
    }

    let authors = engine.controller::<Author>();
    let books = engine.controller::<Book>();

    // Create
    let ursula = authors
        .create(
            &json!({"email": "ursula@example.com", "name": "Ursula K. Le Guin"}),
            Returning::Id,
        )
        .await?
        .id()
        .ok_or_else(|| anyhow::anyhow!("no id returned"))?;

    for (title, published) in [
        ("A Wizard of Earthsea", "1968-11-01"),
        ("The Left Hand of Darkness", "1969-03-01"),
        ("The Dispossessed", "1974-05-01"),
    ] {
        books
            .create(
                &json!({"title": title, "published": published, "author_id": ursula}),
                Returning::Id,
            )
            .await?;
    }

    // Read with an eager-loaded relation
    let author = authors
        .get(&Selector::new("id", ursula), &JoinSpec::from(["books"]))
        .await?;
    println!("\nauthor with books:\n{}", serde_json::to_string_pretty(&author)?);

    // Filter, order, paginate
    let filter = FilterSpec::from_value(&json!({"published": {"gte": "1969-01-01"}}))?;
    let view = books
        .list(
            &filter,
            &OrderSpec::new().desc("published"),
            &JoinSpec::from(["author"]),
            ListMode::page(1, 2),
        )
        .await?;
    println!("\nfirst page of later books:\n{}", serde_json::to_string_pretty(&view)?);

    // Update and upsert
    authors
        .update(&Selector::new("id", ursula), &json!({"name": "Ursula Le Guin"}), Returning::Id)
        .await?;
    let saved = authors
        .upsert(
            &Selector::new("email", "octavia@example.com"),
            &json!({"email": "octavia@example.com", "name": "Octavia E. Butler"}),
            Returning::Object,
        )
        .await?;
    println!("\nupserted:\n{}", serde_json::to_string_pretty(&saved)?);

    // Duplicate keys surface as a typed error
    if let Err(err) = authors
        .create(&json!({"email": "ursula@example.com", "name": "Copy"}), Returning::Id)
        .await
    {
        println!("\nrejected duplicate: {}", err);
    }

    // Archive and delete
    authors.archive(&Selector::new("email", "octavia@example.com")).await?;
    books.delete(&Selector::new("title", "The Dispossessed")).await?;

    let remaining = books
        .list(&FilterSpec::new(), &OrderSpec::new().asc("title"), &JoinSpec::new(), ListMode::All)
        .await?;
    println!("\n{} book(s) left", remaining.records().len());

    engine.close().await;
    Ok(())
}
