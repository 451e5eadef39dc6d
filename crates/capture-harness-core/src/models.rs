//! Core data models used throughout Capture Harness.
//!
//! Every enum-valued column of the storage schema is a closed Rust enum
//! here, so a value outside the accepted set cannot reach a [`Store`](crate::store::Store).
//! The string forms (`as_str` / `parse`) match the database values exactly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a persisted entry. Goals are stored separately, see [`Goal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Task,
    Note,
    Insight,
    Bookmark,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Task,
        EntryType::Note,
        EntryType::Insight,
        EntryType::Bookmark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Task => "task",
            EntryType::Note => "note",
            EntryType::Insight => "insight",
            EntryType::Bookmark => "bookmark",
        }
    }

    /// Parses a database or user value. Case and surrounding whitespace are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "task" => Some(EntryType::Task),
            "note" => Some(EntryType::Note),
            "insight" => Some(EntryType::Insight),
            "bookmark" => Some(EntryType::Bookmark),
            _ => None,
        }
    }
}

/// Kanban column of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 3] = [
        EntryStatus::Pending,
        EntryStatus::InProgress,
        EntryStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::InProgress => "in_progress",
            EntryStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(EntryStatus::Pending),
            "in_progress" => Some(EntryStatus::InProgress),
            "done" => Some(EntryStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Recurrence window of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Daily => "daily",
            PeriodType::Weekly => "weekly",
            PeriodType::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "daily" => Some(PeriodType::Daily),
            "weekly" => Some(PeriodType::Weekly),
            "monthly" => Some(PeriodType::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// Typed metadata stored with an entry.
///
/// Only documented keys survive normalization; nothing from the
/// classifier is passed through as an open map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Set on the history entry written alongside a goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
}

/// A persisted, classified unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    /// The raw capture text.
    pub content: String,
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub priority: Option<Priority>,
    pub category_id: Option<String>,
    pub metadata: EntryMetadata,
    pub due_date: Option<NaiveDate>,
    pub checklist: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recurring objective with a numeric target per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub category_id: Option<String>,
    pub emoji: Option<String>,
    pub target: f64,
    pub unit: Option<String>,
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
    pub current: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub emoji: Option<String>,
}

/// Optional filters for listing entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        self.entry_type.map_or(true, |t| t == entry.entry_type)
            && self.status.map_or(true, |s| s == entry.status)
    }
}
