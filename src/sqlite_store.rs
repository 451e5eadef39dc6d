//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the schema created by
//! [`migrate::apply_schema`](crate::migrate::apply_schema). Enum columns
//! are stored as their snake_case names, timestamps as Unix milliseconds,
//! dates as `YYYY-MM-DD`, and metadata / checklists as JSON text.
//!
//! Constraint failures reported by SQLite (`CHECK`, `UNIQUE`, `NOT NULL`,
//! foreign keys) come back as [`StoreError::ConstraintViolation`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use capture_harness_core::models::{
    Category, ChecklistItem, Entry, EntryFilter, EntryMetadata, EntryStatus, EntryType, Goal,
    PeriodType, Priority,
};
use capture_harness_core::store::{Store, StoreError};

use crate::config::Config;
use crate::db;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database named in `[db]`.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn store_err(table: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreError::constraint(table, db.message()),
            _ if db.message().contains("constraint failed") => {
                StoreError::constraint(table, db.message())
            }
            _ => StoreError::Backend(err.to_string()),
        },
        _ => StoreError::Backend(err.to_string()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Backend(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Backend(format!("invalid JSON in {}: {}", column, e)))
}

fn parse_date(column: &str, raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StoreError::Backend(format!("invalid date in {}: {}", column, e)))
}

fn from_millis(column: &str, ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range in {}", column)))
}

fn unknown(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unknown {} '{}'", column, value))
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(e.to_string()))
}

fn row_to_category(row: &SqliteRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: get(row, "id")?,
        slug: get(row, "slug")?,
        name: get(row, "name")?,
        emoji: get(row, "emoji")?,
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<Entry, StoreError> {
    let entry_type: String = get(row, "entry_type")?;
    let status: String = get(row, "status")?;
    let priority: Option<String> = get(row, "priority")?;
    let metadata_json: String = get(row, "metadata_json")?;
    let checklist_json: String = get(row, "checklist_json")?;
    let due_date: Option<String> = get(row, "due_date")?;

    Ok(Entry {
        id: get(row, "id")?,
        user_id: get(row, "user_id")?,
        content: get(row, "content")?,
        entry_type: EntryType::parse(&entry_type)
            .ok_or_else(|| unknown("entry_type", &entry_type))?,
        status: EntryStatus::parse(&status).ok_or_else(|| unknown("status", &status))?,
        priority: priority
            .map(|p| Priority::parse(&p).ok_or_else(|| unknown("priority", &p)))
            .transpose()?,
        category_id: get(row, "category_id")?,
        metadata: from_json::<EntryMetadata>("metadata_json", &metadata_json)?,
        due_date: due_date.map(|d| parse_date("due_date", &d)).transpose()?,
        checklist: from_json::<Vec<ChecklistItem>>("checklist_json", &checklist_json)?,
        created_at: from_millis("created_at", get(row, "created_at")?)?,
        updated_at: from_millis("updated_at", get(row, "updated_at")?)?,
    })
}

fn row_to_goal(row: &SqliteRow) -> Result<Goal, StoreError> {
    let period_type: String = get(row, "period_type")?;
    let period_start: String = get(row, "period_start")?;

    Ok(Goal {
        id: get(row, "id")?,
        user_id: get(row, "user_id")?,
        title: get(row, "title")?,
        category_id: get(row, "category_id")?,
        emoji: get(row, "emoji")?,
        target: get(row, "target")?,
        unit: get(row, "unit")?,
        period_type: PeriodType::parse(&period_type)
            .ok_or_else(|| unknown("period_type", &period_type))?,
        period_start: parse_date("period_start", &period_start)?,
        current: get(row, "current")?,
        created_at: from_millis("created_at", get(row, "created_at")?)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, slug, name, emoji FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("categories", e))?;
        row.as_ref().map(row_to_category).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, slug, name, emoji FROM categories ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err("categories", e))?;
        rows.iter().map(row_to_category).collect()
    }

    async fn insert_category(&self, category: &Category) -> Result<Category, StoreError> {
        sqlx::query("INSERT INTO categories (id, slug, name, emoji) VALUES (?, ?, ?, ?)")
            .bind(&category.id)
            .bind(&category.slug)
            .bind(&category.name)
            .bind(&category.emoji)
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("categories", e))?;
        Ok(category.clone())
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO entries (id, user_id, content, entry_type, status, priority,
                                 category_id, metadata_json, due_date, checklist_json,
                                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.content)
        .bind(entry.entry_type.as_str())
        .bind(entry.status.as_str())
        .bind(entry.priority.map(|p| p.as_str()))
        .bind(&entry.category_id)
        .bind(to_json(&entry.metadata)?)
        .bind(entry.due_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(to_json(&entry.checklist)?)
        .bind(entry.created_at.timestamp_millis())
        .bind(entry.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("entries", e))?;

        Ok(entry.clone())
    }

    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>, StoreError> {
        let row = sqlx::query("SELECT * FROM entries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("entries", e))?;
        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list_entries(
        &self,
        user_id: &str,
        filter: &EntryFilter,
    ) -> Result<Vec<Entry>, StoreError> {
        let entry_type = filter.entry_type.map(|t| t.as_str());
        let status = filter.status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT * FROM entries
            WHERE user_id = ?
              AND (? IS NULL OR entry_type = ?)
              AND (? IS NULL OR status = ?)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(entry_type)
        .bind(entry_type)
        .bind(status)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("entries", e))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE entries SET status = ?, checklist_json = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(entry.status.as_str())
        .bind(to_json(&entry.checklist)?)
        .bind(entry.updated_at.timestamp_millis())
        .bind(&entry.id)
        .bind(&entry.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("entries", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("entry", entry.id.clone()));
        }

        self.get_entry(&entry.user_id, &entry.id)
            .await?
            .ok_or_else(|| StoreError::not_found("entry", entry.id.clone()))
    }

    async fn insert_goal(&self, goal: &Goal) -> Result<Goal, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO goals (id, user_id, title, category_id, emoji, target, unit,
                               period_type, period_start, current, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&goal.id)
        .bind(&goal.user_id)
        .bind(&goal.title)
        .bind(&goal.category_id)
        .bind(&goal.emoji)
        .bind(goal.target)
        .bind(&goal.unit)
        .bind(goal.period_type.as_str())
        .bind(goal.period_start.format(DATE_FORMAT).to_string())
        .bind(goal.current)
        .bind(goal.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("goals", e))?;

        Ok(goal.clone())
    }

    async fn get_goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>, StoreError> {
        let row = sqlx::query("SELECT * FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("goals", e))?;
        row.as_ref().map(row_to_goal).transpose()
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM goals WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("goals", e))?;
        rows.iter().map(row_to_goal).collect()
    }

    async fn update_goal(&self, goal: &Goal) -> Result<Goal, StoreError> {
        let result = sqlx::query(
            "UPDATE goals SET current = ?, period_start = ? WHERE id = ? AND user_id = ?",
        )
        .bind(goal.current)
        .bind(goal.period_start.format(DATE_FORMAT).to_string())
        .bind(&goal.id)
        .bind(&goal.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("goals", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("goal", goal.id.clone()));
        }

        self.get_goal(&goal.user_id, &goal.id)
            .await?
            .ok_or_else(|| StoreError::not_found("goal", goal.id.clone()))
    }
}
