//! Operations on saved entries, goals and categories.
//!
//! These back the Kanban moves, checklist ticks and goal progress buttons
//! of the tracker. All of them go through the [`Store`] trait.

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{Category, Entry, EntryStatus, Goal};
use crate::period::period_start;
use crate::store::{Store, StoreError};

/// Categories created by `init`: `(slug, name, emoji)`.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 7] = [
    ("ideas", "Ideas", "💡"),
    ("work", "Work", "💼"),
    ("personal", "Personal", "🙂"),
    ("health", "Health", "🏃"),
    ("finance", "Finance", "💰"),
    ("learning", "Learning", "📚"),
    ("home", "Home", "🏠"),
];

/// Insert any missing default category. Returns how many were added.
pub async fn seed_default_categories(store: &dyn Store) -> Result<usize, StoreError> {
    let mut added = 0;
    for (slug, name, emoji) in DEFAULT_CATEGORIES {
        if store.find_category_by_slug(slug).await?.is_some() {
            continue;
        }
        store
            .insert_category(&Category {
                id: Uuid::new_v4().to_string(),
                slug: slug.to_string(),
                name: name.to_string(),
                emoji: Some(emoji.to_string()),
            })
            .await?;
        added += 1;
    }
    Ok(added)
}

async fn load_entry(store: &dyn Store, user_id: &str, id: &str) -> Result<Entry, StoreError> {
    store
        .get_entry(user_id, id)
        .await?
        .ok_or_else(|| StoreError::not_found("entry", id))
}

/// Move an entry to another Kanban column.
pub async fn update_entry_status(
    store: &dyn Store,
    user_id: &str,
    id: &str,
    status: EntryStatus,
) -> Result<Entry, StoreError> {
    let mut entry = load_entry(store, user_id, id).await?;
    entry.status = status;
    entry.updated_at = Utc::now();
    let entry = store.update_entry(&entry).await?;
    info!(entry_id = %entry.id, status = status.as_str(), "entry status updated");
    Ok(entry)
}

/// Flip the `done` flag of one checklist item.
pub async fn toggle_checklist_item(
    store: &dyn Store,
    user_id: &str,
    id: &str,
    index: usize,
) -> Result<Entry, StoreError> {
    let mut entry = load_entry(store, user_id, id).await?;
    let len = entry.checklist.len();
    let item = entry.checklist.get_mut(index).ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "checklist index {} out of range (entry has {} items)",
            index, len
        ))
    })?;
    item.done = !item.done;
    entry.updated_at = Utc::now();
    store.update_entry(&entry).await
}

/// Add `amount` to a goal's progress for the period containing `today`.
///
/// When the stored period has ended, progress restarts from zero in the
/// new period before `amount` is applied. Progress never goes below zero.
pub async fn record_goal_progress(
    store: &dyn Store,
    user_id: &str,
    goal_id: &str,
    amount: f64,
    today: NaiveDate,
) -> Result<Goal, StoreError> {
    if !amount.is_finite() {
        return Err(StoreError::InvalidInput(
            "progress amount must be a finite number".to_string(),
        ));
    }

    let mut goal = store
        .get_goal(user_id, goal_id)
        .await?
        .ok_or_else(|| StoreError::not_found("goal", goal_id))?;

    let current_period = period_start(goal.period_type, today);
    if current_period != goal.period_start {
        info!(goal_id, from = %goal.period_start, to = %current_period, "goal period rolled over");
        goal.period_start = current_period;
        goal.current = 0.0;
    }
    goal.current = (goal.current + amount).max(0.0);

    store.update_goal(&goal).await
}

/// True when the goal's target has been met in its current period.
pub fn goal_reached(goal: &Goal) -> bool {
    goal.current >= goal.target
}
