//! Shared fixtures for integration tests
//!
//! `RecordingBackend` wraps the memory backend, keeps every partial update it
//! sees and can be told to fail updates on one table. The library models
//! below add one-to-one and cascaded many-to-many relations next to the blog
//! domain's one-to-many.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use softhaus::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub table: &'static str,
    pub changes: Map<String, Value>,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    updates: Mutex<Vec<RecordedUpdate>>,
    fail_updates_on: Mutex<Option<&'static str>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &MemoryBackend {
        &self.inner
    }

    /// Every update that touched at least one row
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.rows > 0)
            .cloned()
            .collect()
    }

    pub fn updates_on(&self, table: &str) -> Vec<RecordedUpdate> {
        self.updates()
            .into_iter()
            .filter(|u| u.table == table)
            .collect()
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }

    pub fn fail_updates_on(&self, table: &'static str) {
        *self.fail_updates_on.lock().unwrap() = Some(table);
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        self.inner.insert(table, row).await
    }

    async fn select(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
    ) -> Result<Vec<Value>, StoreError> {
        self.inner.select(table, query).await
    }

    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<i64, StoreError> {
        self.inner.count(table, query).await
    }

    async fn update_where(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
        changes: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError> {
        if *self.fail_updates_on.lock().unwrap() == Some(table.name) {
            return Err(StoreError::storage(table.name, "update", "injected failure"));
        }

        let rows = self
            .inner
            .update_where(table, query, changes.clone())
            .await?;
        self.updates.lock().unwrap().push(RecordedUpdate {
            table: table.name,
            changes,
            rows: rows.len(),
        });
        Ok(rows)
    }

    async fn delete_where(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError> {
        self.inner.delete_where(table, query).await
    }

    async fn linked(&self, join: &JoinTable, owner_id: &Value) -> Result<Vec<Value>, StoreError> {
        self.inner.linked(join, owner_id).await
    }

    async fn link(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<(), StoreError> {
        self.inner.link(join, owner_id, target_id).await
    }

    async fn unlink(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<bool, StoreError> {
        self.inner.unlink(join, owner_id, target_id).await
    }
}

pub struct Fixture {
    pub softhaus: SoftHaus,
    pub backend: Arc<RecordingBackend>,
    pub clock: Arc<ManualClock>,
}

pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn fixture() -> Fixture {
    fixture_with(SoftDeleteConfig::default())
}

pub fn fixture_with(config: SoftDeleteConfig) -> Fixture {
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(ManualClock::new(start_time()));
    let softhaus =
        SoftHaus::with_backend(backend.clone(), config).with_clock(clock.clone());

    Fixture {
        softhaus,
        backend,
        clock,
    }
}

// Library domain: authors own a profile (one-to-one) and books (many-to-many,
// cascaded); books own chapters (one-to-many) and cascade back to authors.

pub const AUTHOR_BOOKS: JoinTable = JoinTable::new("author_books", "author_id", "book_id");

#[model]
#[table(name = "authors")]
pub struct Author {
    #[primary_key]
    pub id: Uuid,

    #[field(update, search)]
    pub name: String,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Author {
    pub const PROFILE: Relation<Author, Profile> = Relation::one_to_one("profile", "author_id");
    pub const BOOKS: Relation<Author, Book> = Relation::many_to_many("books", AUTHOR_BOOKS);

    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Author {
    fn dependents() -> Dependents<Self> {
        Dependents::new()
            .cascade(Author::PROFILE)
            .cascade(Author::BOOKS)
    }
}

#[model]
#[table(name = "profiles")]
pub struct Profile {
    #[primary_key]
    pub id: Uuid,

    pub author_id: Uuid,

    #[field(update)]
    pub bio: String,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Profile {
    pub fn new(author: &Author, bio: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id: author.id,
            bio: bio.to_string(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Profile {}

#[model]
#[table(name = "books")]
pub struct Book {
    #[primary_key]
    pub id: Uuid,

    #[field(update, search)]
    pub title: String,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Book {
    pub const CHAPTERS: Relation<Book, Chapter> = Relation::one_to_many("chapters", "book_id");
    pub const AUTHORS: Relation<Book, Author> =
        Relation::many_to_many("authors", AUTHOR_BOOKS.reversed());

    pub fn new(title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Book {
    fn dependents() -> Dependents<Self> {
        Dependents::new()
            .cascade(Book::CHAPTERS)
            .cascade(Book::AUTHORS)
    }
}

#[model]
#[table(name = "chapters")]
pub struct Chapter {
    #[primary_key]
    pub id: i64,

    pub book_id: Uuid,

    #[field(update)]
    pub heading: String,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Chapter {
    pub fn new(id: i64, book: &Book, heading: &str) -> Self {
        Self {
            id,
            book_id: book.id,
            heading: heading.to_string(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Chapter {}
