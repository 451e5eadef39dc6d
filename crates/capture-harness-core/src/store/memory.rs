//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Enforces the same row
//! constraints as the SQLite schema that the type system cannot: unique
//! ids and slugs, non-blank user ids, category foreign keys, and positive
//! goal targets.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::models::{Category, Entry, EntryFilter, Goal};

use super::{Store, StoreError};

pub struct InMemoryStore {
    categories: RwLock<Vec<Category>>,
    entries: RwLock<Vec<Entry>>,
    goals: RwLock<Vec<Goal>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            categories: RwLock::new(Vec::new()),
            entries: RwLock::new(Vec::new()),
            goals: RwLock::new(Vec::new()),
        }
    }

    /// Store pre-populated with the given categories.
    pub fn with_categories(categories: Vec<Category>) -> Self {
        let store = Self::new();
        *store.categories.write().unwrap_or_else(PoisonError::into_inner) = categories;
        store
    }

    fn category_exists(&self, id: &str) -> Result<bool, StoreError> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.iter().any(|c| c.id == id))
    }

    fn check_category_fk(&self, table: &str, category_id: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = category_id {
            if !self.category_exists(id)? {
                return Err(StoreError::constraint(
                    table,
                    format!("category_id references unknown category {}", id),
                ));
            }
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

fn check_user(table: &str, user_id: &str) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::constraint(table, "user_id must not be blank"));
    }
    Ok(())
}

fn check_goal_numbers(goal: &Goal) -> Result<(), StoreError> {
    if !(goal.target.is_finite() && goal.target > 0.0) {
        return Err(StoreError::constraint("goals", "target must be > 0"));
    }
    if !(goal.current.is_finite() && goal.current >= 0.0) {
        return Err(StoreError::constraint("goals", "current must be >= 0"));
    }
    Ok(())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.categories.read().map_err(poisoned)?.clone();
        categories.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(categories)
    }

    async fn insert_category(&self, category: &Category) -> Result<Category, StoreError> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        if categories.iter().any(|c| c.id == category.id) {
            return Err(StoreError::constraint("categories", "duplicate id"));
        }
        if categories.iter().any(|c| c.slug == category.slug) {
            return Err(StoreError::constraint(
                "categories",
                format!("duplicate slug {}", category.slug),
            ));
        }
        categories.push(category.clone());
        Ok(category.clone())
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        check_user("entries", &entry.user_id)?;
        self.check_category_fk("entries", entry.category_id.as_deref())?;

        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::constraint("entries", "duplicate id"));
        }
        entries.push(entry.clone());
        Ok(entry.clone())
    }

    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        user_id: &str,
        filter: &EntryFilter,
    ) -> Result<Vec<Entry>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut found: Vec<Entry> = entries
            .iter()
            .filter(|e| e.user_id == user_id && filter.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let stored = entries
            .iter_mut()
            .find(|e| e.id == entry.id && e.user_id == entry.user_id)
            .ok_or_else(|| StoreError::not_found("entry", entry.id.clone()))?;
        stored.status = entry.status;
        stored.checklist = entry.checklist.clone();
        stored.updated_at = entry.updated_at;
        Ok(stored.clone())
    }

    async fn insert_goal(&self, goal: &Goal) -> Result<Goal, StoreError> {
        check_user("goals", &goal.user_id)?;
        check_goal_numbers(goal)?;
        self.check_category_fk("goals", goal.category_id.as_deref())?;

        let mut goals = self.goals.write().map_err(poisoned)?;
        if goals.iter().any(|g| g.id == goal.id) {
            return Err(StoreError::constraint("goals", "duplicate id"));
        }
        goals.push(goal.clone());
        Ok(goal.clone())
    }

    async fn get_goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>, StoreError> {
        let goals = self.goals.read().map_err(poisoned)?;
        Ok(goals
            .iter()
            .find(|g| g.id == id && g.user_id == user_id)
            .cloned())
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        let goals = self.goals.read().map_err(poisoned)?;
        let mut found: Vec<Goal> = goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_goal(&self, goal: &Goal) -> Result<Goal, StoreError> {
        check_goal_numbers(goal)?;
        let mut goals = self.goals.write().map_err(poisoned)?;
        let stored = goals
            .iter_mut()
            .find(|g| g.id == goal.id && g.user_id == goal.user_id)
            .ok_or_else(|| StoreError::not_found("goal", goal.id.clone()))?;
        stored.current = goal.current;
        stored.period_start = goal.period_start;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryMetadata, EntryStatus, EntryType, PeriodType};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn category(slug: &str) -> Category {
        Category {
            id: format!("cat-{}", slug),
            slug: slug.to_string(),
            name: slug.to_string(),
            emoji: None,
        }
    }

    fn entry(id: &str, user: &str, secs: i64) -> Entry {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        Entry {
            id: id.to_string(),
            user_id: user.to_string(),
            content: "x".to_string(),
            entry_type: EntryType::Task,
            status: EntryStatus::Pending,
            priority: None,
            category_id: None,
            metadata: EntryMetadata::default(),
            due_date: None,
            checklist: Vec::new(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn goal(target: f64) -> Goal {
        Goal {
            id: "g1".to_string(),
            user_id: "u1".to_string(),
            title: "run".to_string(),
            category_id: None,
            emoji: None,
            target,
            unit: None,
            period_type: PeriodType::Weekly,
            period_start: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            current: 0.0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_category_lookup() {
        let store = InMemoryStore::with_categories(vec![category("work")]);
        assert!(store.find_category_by_slug("work").await.unwrap().is_some());
        assert!(store.find_category_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = InMemoryStore::with_categories(vec![category("work")]);
        let mut dup = category("work");
        dup.id = "other".to_string();
        let err = store.insert_category(&dup).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_entry_foreign_key_enforced() {
        let store = InMemoryStore::new();
        let mut e = entry("e1", "u1", 0);
        e.category_id = Some("missing".to_string());
        let err = store.insert_entry(&e).await.unwrap_err();
        assert!(
            matches!(err, StoreError::ConstraintViolation { ref table, .. } if table == "entries")
        );
    }

    #[tokio::test]
    async fn test_blank_user_rejected() {
        let store = InMemoryStore::new();
        let err = store.insert_entry(&entry("e1", " ", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_entries_newest_first_and_scoped_to_user() {
        let store = InMemoryStore::new();
        store.insert_entry(&entry("old", "u1", 10)).await.unwrap();
        store.insert_entry(&entry("new", "u1", 20)).await.unwrap();
        store.insert_entry(&entry("other", "u2", 30)).await.unwrap();

        let listed = store
            .list_entries("u1", &EntryFilter::default())
            .await
            .unwrap();
        let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_goal_target_constraint() {
        let store = InMemoryStore::new();
        assert!(store.insert_goal(&goal(0.0)).await.is_err());
        assert!(store.insert_goal(&goal(f64::NAN)).await.is_err());
        assert!(store.insert_goal(&goal(3.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_goal_not_found() {
        let store = InMemoryStore::new();
        let err = store.update_goal(&goal(3.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "goal", .. }));
    }
}
