//! Storage abstraction for Capture Harness.
//!
//! The [`Store`] trait covers the three table-like resources the pipeline
//! writes to (`entries`, `goals`, `categories`) plus the reads and updates
//! the CLI and HTTP API need. The backing database is the enforcement point
//! for its own constraints; inserts return the created row or a
//! [`StoreError::ConstraintViolation`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Category, Entry, EntryFilter, Goal};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violation on {table}: {message}")]
    ConstraintViolation { table: String, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn constraint(table: &str, message: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_category_by_slug`](Store::find_category_by_slug) | Resolve a category slug to its row |
/// | [`list_categories`](Store::list_categories) | All categories, by slug |
/// | [`insert_category`](Store::insert_category) | Add a category |
/// | [`insert_entry`](Store::insert_entry) | Persist a new entry |
/// | [`get_entry`](Store::get_entry) | Fetch one entry of a user |
/// | [`list_entries`](Store::list_entries) | Entries of a user, newest first |
/// | [`update_entry`](Store::update_entry) | Overwrite the mutable fields of an entry |
/// | [`insert_goal`](Store::insert_goal) | Persist a new goal |
/// | [`get_goal`](Store::get_goal) | Fetch one goal of a user |
/// | [`list_goals`](Store::list_goals) | Goals of a user, newest first |
/// | [`update_goal`](Store::update_goal) | Overwrite progress fields of a goal |
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn insert_category(&self, category: &Category) -> Result<Category, StoreError>;

    async fn insert_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>, StoreError>;

    async fn list_entries(
        &self,
        user_id: &str,
        filter: &EntryFilter,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Writes `status`, `checklist` and `updated_at`. Unknown id → [`StoreError::NotFound`].
    async fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    async fn insert_goal(&self, goal: &Goal) -> Result<Goal, StoreError>;

    async fn get_goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>, StoreError>;

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError>;

    /// Writes `current` and `period_start`. Unknown id → [`StoreError::NotFound`].
    async fn update_goal(&self, goal: &Goal) -> Result<Goal, StoreError>;
}
