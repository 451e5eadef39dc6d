//! Entry/goal routing.
//!
//! A normalized capture becomes either a single [`Entry`], or a [`Goal`]
//! plus a companion history entry (type `task`, status `pending`, tagged
//! [`GOAL_TRIGGER_TAG`]). [`plan`] builds the rows without touching the
//! store; [`persist`] writes them.
//!
//! Persistence is one pass with no retries. If the companion entry fails
//! after the goal was written, the goal stays and the error is returned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Entry, EntryMetadata, EntryStatus, EntryType, Goal};
use crate::normalize::{CaptureKind, GoalSpec, NormalizedCapture, DEFAULT_GOAL_TARGET};
use crate::period::period_start;
use crate::store::{Store, StoreError};

/// Tag carried by the history entry written alongside a goal.
pub const GOAL_TRIGGER_TAG: &str = "goal-trigger";

/// Rows produced by routing one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutedRecord {
    Entry { entry: Entry },
    Goal { goal: Goal, history: Entry },
}

impl RoutedRecord {
    /// The entry that shows up in entry listings.
    pub fn entry(&self) -> &Entry {
        match self {
            RoutedRecord::Entry { entry } => entry,
            RoutedRecord::Goal { history, .. } => history,
        }
    }
}

/// Everything routing needs besides the normalized capture.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub user_id: &'a str,
    pub category_id: Option<&'a str>,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

/// Build the rows for a capture. Ids are fresh v4 UUIDs.
pub fn plan(normalized: &NormalizedCapture, ctx: RouteContext<'_>) -> RoutedRecord {
    match normalized.kind {
        CaptureKind::Entry(entry_type) => RoutedRecord::Entry {
            entry: build_entry(normalized, entry_type, &ctx),
        },
        CaptureKind::Goal => {
            let spec = normalized.goal.clone().unwrap_or(GoalSpec {
                target: DEFAULT_GOAL_TARGET,
                unit: None,
                period_type: Default::default(),
            });
            let goal = Goal {
                id: Uuid::new_v4().to_string(),
                user_id: ctx.user_id.to_string(),
                title: goal_title(normalized),
                category_id: ctx.category_id.map(str::to_string),
                emoji: normalized.emoji.clone(),
                target: spec.target,
                unit: spec.unit,
                period_type: spec.period_type,
                period_start: period_start(spec.period_type, ctx.today),
                current: 0.0,
                created_at: ctx.now,
            };
            let history = build_history_entry(normalized, &goal, &ctx);
            RoutedRecord::Goal { goal, history }
        }
    }
}

/// Write the planned rows. Returns the rows as the store created them.
pub async fn persist(store: &dyn Store, record: RoutedRecord) -> Result<RoutedRecord, StoreError> {
    match record {
        RoutedRecord::Entry { entry } => {
            let entry = store.insert_entry(&entry).await?;
            debug!(entry_id = %entry.id, entry_type = entry.entry_type.as_str(), "entry saved");
            Ok(RoutedRecord::Entry { entry })
        }
        RoutedRecord::Goal { goal, history } => {
            let goal = store.insert_goal(&goal).await?;
            debug!(goal_id = %goal.id, period = goal.period_type.as_str(), "goal saved");
            let history = store.insert_entry(&history).await?;
            Ok(RoutedRecord::Goal { goal, history })
        }
    }
}

fn build_entry(
    normalized: &NormalizedCapture,
    entry_type: EntryType,
    ctx: &RouteContext<'_>,
) -> Entry {
    Entry {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.user_id.to_string(),
        content: normalized.content.clone(),
        entry_type,
        status: normalized.status,
        priority: normalized.priority,
        category_id: ctx.category_id.map(str::to_string),
        metadata: EntryMetadata {
            summary: normalized.summary.clone(),
            tags: normalized.tags.clone(),
            emoji: normalized.emoji.clone(),
            goal_id: None,
        },
        due_date: normalized.due_date,
        checklist: normalized.checklist.clone(),
        created_at: ctx.now,
        updated_at: ctx.now,
    }
}

fn build_history_entry(
    normalized: &NormalizedCapture,
    goal: &Goal,
    ctx: &RouteContext<'_>,
) -> Entry {
    let mut tags = normalized.tags.clone();
    if !tags.iter().any(|t| t == GOAL_TRIGGER_TAG) {
        tags.push(GOAL_TRIGGER_TAG.to_string());
    }

    Entry {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.user_id.to_string(),
        content: normalized.content.clone(),
        entry_type: EntryType::Task,
        status: EntryStatus::Pending,
        priority: normalized.priority,
        category_id: ctx.category_id.map(str::to_string),
        metadata: EntryMetadata {
            summary: Some(goal.title.clone()),
            tags,
            emoji: normalized.emoji.clone(),
            goal_id: Some(goal.id.clone()),
        },
        due_date: None,
        checklist: Vec::new(),
        created_at: ctx.now,
        updated_at: ctx.now,
    }
}

fn goal_title(normalized: &NormalizedCapture) -> String {
    normalized
        .summary
        .clone()
        .unwrap_or_else(|| normalized.content.trim().to_string())
}
