//! Classification normalizer.
//!
//! Turns an untrusted, possibly absent [`ClassificationResult`] into a
//! [`NormalizedCapture`] whose every enum field is within the accepted
//! value sets of the storage schema. Normalization never fails: an
//! out-of-range value is replaced by a safe default.
//!
//! Rules, in order:
//!
//! 1. No classification: category `ideas`, type `note`, summary = the raw
//!    text, priority `medium`.
//! 2. Urgency keywords in the raw text force priority `urgent`.
//! 3. Progress keywords in the raw text force status `in_progress`.
//! 4. Enum values are trimmed and lowercased, then validated. Unknown
//!    `entry_type` becomes `note`, unknown `priority` becomes `None`,
//!    unknown or missing `status` becomes `pending`. `period_type` falls
//!    back to `weekly` for goals.
//!
//! Category slug → id resolution needs the store and happens in the
//! pipeline, see [`crate::pipeline::capture`].

use chrono::{DateTime, NaiveDate};

use crate::classification::ClassificationResult;
use crate::heuristics::{is_in_progress, is_urgent};
use crate::models::{ChecklistItem, EntryStatus, EntryType, PeriodType, Priority};

/// Category used when the classifier gave us nothing.
pub const DEFAULT_CATEGORY_SLUG: &str = "ideas";

/// Target used for goals whose classification has no usable target.
pub const DEFAULT_GOAL_TARGET: f64 = 1.0;

/// What the router should persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Entry(EntryType),
    Goal,
}

/// Goal-only fields, present when the capture was classified as a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSpec {
    pub target: f64,
    pub unit: Option<String>,
    pub period_type: PeriodType,
}

/// Which keyword overrides fired. Kept for logging and inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub urgent: bool,
    pub in_progress: bool,
}

/// Schema-valid result of normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCapture {
    pub content: String,
    /// Lowercased slug, `None` when the classifier gave no usable slug.
    pub category_slug: Option<String>,
    pub kind: CaptureKind,
    pub status: EntryStatus,
    pub priority: Option<Priority>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub emoji: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub checklist: Vec<ChecklistItem>,
    pub goal: Option<GoalSpec>,
    pub overrides: Overrides,
}

/// Normalize a capture. Pure: the same inputs always give the same output.
pub fn normalize(
    raw_text: &str,
    classification: Option<&ClassificationResult>,
) -> NormalizedCapture {
    let mut normalized = match classification {
        None => defaults_for(raw_text),
        Some(result) => from_classification(raw_text, result),
    };

    if is_urgent(raw_text) {
        normalized.priority = Some(Priority::Urgent);
        normalized.overrides.urgent = true;
    }

    if is_in_progress(raw_text) {
        normalized.status = EntryStatus::InProgress;
        normalized.overrides.in_progress = true;
    }

    normalized
}

fn defaults_for(raw_text: &str) -> NormalizedCapture {
    NormalizedCapture {
        content: raw_text.to_string(),
        category_slug: Some(DEFAULT_CATEGORY_SLUG.to_string()),
        kind: CaptureKind::Entry(EntryType::Note),
        status: EntryStatus::Pending,
        priority: Some(Priority::Medium),
        summary: Some(raw_text.to_string()),
        tags: Vec::new(),
        emoji: None,
        due_date: None,
        checklist: Vec::new(),
        goal: None,
        overrides: Overrides::default(),
    }
}

fn from_classification(raw_text: &str, result: &ClassificationResult) -> NormalizedCapture {
    let meta = &result.metadata;
    let kind = sanitize_kind(result.entry_type.as_deref());

    let goal = match kind {
        CaptureKind::Goal => Some(GoalSpec {
            target: meta
                .target
                .filter(|t| *t > 0.0)
                .unwrap_or(DEFAULT_GOAL_TARGET),
            unit: meta.unit.clone(),
            period_type: sanitize_period_type(meta.period_type.as_deref()),
        }),
        CaptureKind::Entry(_) => None,
    };

    NormalizedCapture {
        content: raw_text.to_string(),
        category_slug: sanitize_slug(result.category_slug.as_deref()),
        kind,
        status: sanitize_status(result.status.as_deref()),
        priority: sanitize_priority(meta.priority.as_deref()),
        summary: meta.summary.clone(),
        tags: meta.tags.clone(),
        emoji: meta.emoji.clone(),
        due_date: meta.due_date.as_deref().and_then(parse_due_date),
        checklist: meta.checklist.clone(),
        goal,
        overrides: Overrides::default(),
    }
}

/// Unknown or missing types become `note`. `goal` is routed separately.
pub fn sanitize_kind(value: Option<&str>) -> CaptureKind {
    let Some(value) = value else {
        return CaptureKind::Entry(EntryType::Note);
    };
    if value.trim().eq_ignore_ascii_case("goal") {
        return CaptureKind::Goal;
    }
    CaptureKind::Entry(EntryType::parse(value).unwrap_or(EntryType::Note))
}

/// Unknown priorities become `None`, never an invented default.
pub fn sanitize_priority(value: Option<&str>) -> Option<Priority> {
    value.and_then(Priority::parse)
}

pub fn sanitize_status(value: Option<&str>) -> EntryStatus {
    value.and_then(EntryStatus::parse).unwrap_or_default()
}

pub fn sanitize_period_type(value: Option<&str>) -> PeriodType {
    value.and_then(PeriodType::parse).unwrap_or_default()
}

fn sanitize_slug(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; anything else is dropped.
fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
