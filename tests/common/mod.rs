//! Shared models and an in-memory SQLite store for the integration tests

#![allow(dead_code)]

use recordhaus::prelude::*;
use sqlx::sqlite::SqlitePoolOptions;

#[model]
#[table(name = "persons")]
pub struct PersonModel {
    #[primary_key]
    pub id: i64,

    #[field(unique)]
    pub tax_id: String,

    pub name: String,

    pub birth_date: NaiveDate,

    pub nickname: Option<String>,

    #[relation(has_many, foreign_key = "person_id")]
    pub addresses: Option<Vec<AddressModel>>,
}

#[model]
#[table(name = "addresses")]
pub struct AddressModel {
    #[primary_key]
    pub id: i64,

    pub street: String,

    pub city: String,

    pub person_id: i64,

    #[relation(belongs_to, foreign_key = "person_id")]
    pub person: Option<Box<PersonModel>>,
}

#[model]
#[table(name = "uuid_users")]
pub struct UsersModel {
    #[primary_key]
    pub id: Uuid,

    #[field(unique)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    Done,
}

#[model]
#[table(name = "tasks", without_archive)]
pub struct TaskModel {
    #[primary_key]
    pub id: i64,

    pub title: String,

    #[field(enumeration)]
    pub status: TaskStatus,

    pub metadata: Option<Value>,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE persons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tax_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        birth_date DATE NOT NULL,
        nickname TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        street TEXT NOT NULL,
        city TEXT NOT NULL,
        person_id INTEGER NOT NULL REFERENCES persons(id),
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE uuid_users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        status TEXT NOT NULL,
        metadata TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )",
];

/// One shared connection, so every unit of work sees the same in-memory database
pub async fn setup_store() -> SqlStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("create test table");
    }

    SqlStore::sqlite(pool)
}

pub fn persons(store: &SqlStore) -> Controller<PersonModel, SqlStore> {
    Controller::new(store.clone())
}

pub fn addresses(store: &SqlStore) -> Controller<AddressModel, SqlStore> {
    Controller::new(store.clone())
}

pub fn users(store: &SqlStore) -> Controller<UsersModel, SqlStore> {
    Controller::new(store.clone())
}

pub fn tasks(store: &SqlStore) -> Controller<TaskModel, SqlStore> {
    Controller::new(store.clone())
}

pub async fn create_person(
    ctrl: &Controller<PersonModel, SqlStore>,
    tax_id: &str,
    name: &str,
    birth_date: &str,
) -> RecordId {
    let saved = ctrl
        .create(
            &json!({
                "tax_id": tax_id,
                "name": name,
                "birth_date": birth_date,
                "nickname": format!("nick-{}", tax_id),
            }),
            Returning::Id,
        )
        .await
        .expect("create person");
    saved.id().expect("id returned")
}

pub async fn create_thiago(ctrl: &Controller<PersonModel, SqlStore>) -> RecordId {
    create_person(ctrl, "123456789", "Thiago Martin", "1990-01-01").await
}

pub fn names(records: &[Fields]) -> Vec<String> {
    records
        .iter()
        .map(|record| record["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
