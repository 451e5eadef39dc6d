//! The capture pipeline.
//!
//! One linear pass per capture:
//!
//! 1. Reject the capture if there is no authenticated session or the text
//!    is blank, before any network call.
//! 2. Ask the [`ClassificationSource`]. Its failures never propagate: an
//!    unavailable classifier yields `None` and the defaults path.
//! 3. [`normalize`] the result.
//! 4. Resolve the category slug to an id. No match leaves it uncategorized.
//! 5. [`router::plan`] and [`router::persist`]. A store error here is
//!    terminal for the capture.
//!
//! The pipeline holds no state between calls; concurrent captures share
//! nothing but the store.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classification::ClassificationResult;
use crate::normalize::{normalize, NormalizedCapture};
use crate::router::{self, RouteContext, RoutedRecord};
use crate::session::Session;
use crate::store::{Store, StoreError};

/// Which transport produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Managed function invocation with the session's credentials.
    Managed,
    /// Direct HTTP call with the public credential.
    Direct,
}

/// Result of asking the classifier. Has no error variant: failures are
/// folded into `Unavailable` so callers can always proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutcome {
    Classified {
        result: ClassificationResult,
        transport: Transport,
    },
    Unavailable {
        reason: String,
    },
}

/// Anything that can classify a capture.
#[async_trait]
pub trait ClassificationSource: Send + Sync {
    async fn classify(&self, session: &Session, text: &str, today: NaiveDate) -> ClassifierOutcome;
}

/// How the AI step went, reported back so the user can be told.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiStatus {
    Classified { transport: Transport },
    Unavailable { reason: String },
}

impl AiStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AiStatus::Unavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub record: RoutedRecord,
    pub ai: AiStatus,
    /// Slug chosen by the classifier (or the default). The record's
    /// `category_id` is `None` when it matched no category.
    pub category_slug: Option<String>,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no authenticated session")]
    Unauthenticated,

    #[error("capture text is empty")]
    EmptyContent,

    #[error("failed to save capture: {0}")]
    Persistence(#[from] StoreError),
}

/// Run one capture through the pipeline.
///
/// `today` is the user's local date; it drives goal period boundaries and
/// is forwarded to the classifier as the reference date.
pub async fn capture(
    store: &dyn Store,
    classifier: &dyn ClassificationSource,
    session: Option<&Session>,
    text: &str,
    today: NaiveDate,
) -> Result<CaptureOutcome, CaptureError> {
    let session = session
        .filter(|s| s.is_authenticated())
        .ok_or(CaptureError::Unauthenticated)?;
    if text.trim().is_empty() {
        return Err(CaptureError::EmptyContent);
    }

    let (classification, ai) = match classifier.classify(session, text, today).await {
        ClassifierOutcome::Classified { result, transport } => {
            (Some(result), AiStatus::Classified { transport })
        }
        ClassifierOutcome::Unavailable { reason } => {
            warn!(%reason, "classification unavailable, using defaults");
            (None, AiStatus::Unavailable { reason })
        }
    };

    let normalized = normalize(text, classification.as_ref());
    let category_id = resolve_category(store, &normalized).await?;

    let planned = router::plan(
        &normalized,
        RouteContext {
            user_id: &session.user_id,
            category_id: category_id.as_deref(),
            today,
            now: Utc::now(),
        },
    );
    let record = router::persist(store, planned).await?;

    info!(
        user_id = %session.user_id,
        entry_id = %record.entry().id,
        goal = matches!(record, RoutedRecord::Goal { .. }),
        urgent_override = normalized.overrides.urgent,
        in_progress_override = normalized.overrides.in_progress,
        ai_degraded = ai.is_degraded(),
        "capture saved"
    );

    Ok(CaptureOutcome {
        record,
        ai,
        category_slug: normalized.category_slug,
    })
}

async fn resolve_category(
    store: &dyn Store,
    normalized: &NormalizedCapture,
) -> Result<Option<String>, StoreError> {
    let Some(slug) = normalized.category_slug.as_deref() else {
        return Ok(None);
    };
    let category = store.find_category_by_slug(slug).await?;
    if category.is_none() {
        debug!(slug, "no category matches slug, saving uncategorized");
    }
    Ok(category.map(|c| c.id))
}
