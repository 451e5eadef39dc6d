//! Idempotent schema setup.
//!
//! Every enum column carries a `CHECK` constraint and category references
//! are foreign keys, so the database rejects rows the pipeline should
//! never produce.

use anyhow::Result;
use sqlx::SqlitePool;

use capture_harness_core::tracker::seed_default_categories;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Create the schema and seed the default categories.
///
/// Returns the number of categories added by this run.
pub async fn run_migrations(config: &Config) -> Result<usize> {
    let store = SqliteStore::open(config).await?;
    apply_schema(store.pool()).await?;
    let seeded = seed_default_categories(&store).await?;

    store.close().await;
    Ok(seeded)
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            emoji TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL CHECK (length(trim(user_id)) > 0),
            content TEXT NOT NULL,
            entry_type TEXT NOT NULL
                CHECK (entry_type IN ('task', 'note', 'insight', 'bookmark')),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in_progress', 'done')),
            priority TEXT
                CHECK (priority IS NULL OR priority IN ('low', 'medium', 'high', 'urgent')),
            category_id TEXT,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            due_date TEXT,
            checklist_json TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS goals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL CHECK (length(trim(user_id)) > 0),
            title TEXT NOT NULL,
            category_id TEXT,
            emoji TEXT,
            target REAL NOT NULL CHECK (target > 0),
            unit TEXT,
            period_type TEXT NOT NULL DEFAULT 'weekly'
                CHECK (period_type IN ('daily', 'weekly', 'monthly')),
            period_start TEXT NOT NULL,
            current REAL NOT NULL DEFAULT 0 CHECK (current >= 0),
            created_at INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_entries_user_created ON entries(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_user_status ON entries(user_id, status)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_goals_user_created ON goals(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
