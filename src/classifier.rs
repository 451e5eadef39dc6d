//! HTTP clients for the classification function.
//!
//! [`HttpClassifier`] implements [`ClassificationSource`] with two
//! transports tried in order:
//!
//! 1. **Managed**: `POST {functions_url}/{function_name}` with the
//!    session's access token (or the anon key when the session has none)
//!    as bearer, plus the `apikey` header.
//! 2. **Direct**: `POST {direct_url}` with the anon key as bearer.
//!
//! Any failure of the first (network error, non-2xx, `{"error": ...}` body,
//! unparseable body) triggers exactly one attempt on the second. When both
//! fail the outcome is [`ClassifierOutcome::Unavailable`]; nothing here
//! returns an error to the pipeline.
//!
//! Use [`create_classifier`] to build the configured source. Without a
//! `functions_url` it returns [`DisabledClassifier`], which always reports
//! the classifier as unavailable.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use capture_harness_core::classification::{ClassificationResult, MalformedResponse};
use capture_harness_core::pipeline::Transport;
use capture_harness_core::{ClassificationSource, ClassifierOutcome, Session};

use crate::config::ClassifierConfig;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] MalformedResponse),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Classifier backed by the remote classification function.
pub struct HttpClassifier {
    client: reqwest::Client,
    managed_url: String,
    direct_url: String,
    anon_key: Option<String>,
}

impl HttpClassifier {
    /// Build from configuration. Fails when `functions_url` is unset.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let managed_url = config
            .managed_url()
            .ok_or_else(|| anyhow::anyhow!("classifier.functions_url required"))?;
        let direct_url = config.direct_url().unwrap_or_else(|| managed_url.clone());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            managed_url,
            direct_url,
            anon_key: config.resolve_anon_key(),
        })
    }

    async fn call_managed(
        &self,
        session: &Session,
        body: &serde_json::Value,
    ) -> Result<ClassificationResult, ClassifierError> {
        let bearer = session
            .access_token
            .as_deref()
            .or(self.anon_key.as_deref())
            .ok_or(ClassifierError::MissingCredential(
                "session access token or anon key",
            ))?;

        let mut request = self.client.post(&self.managed_url).bearer_auth(bearer);
        if let Some(anon) = &self.anon_key {
            request = request.header("apikey", anon);
        }
        send(request.json(body)).await
    }

    async fn call_direct(
        &self,
        body: &serde_json::Value,
    ) -> Result<ClassificationResult, ClassifierError> {
        let anon = self
            .anon_key
            .as_deref()
            .ok_or(ClassifierError::MissingCredential("anon key"))?;

        send(self.client.post(&self.direct_url).bearer_auth(anon).json(body)).await
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<ClassificationResult, ClassifierError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ClassifierError::Status {
            status: status.as_u16(),
            body: truncate(&text),
        });
    }

    Ok(ClassificationResult::from_body(&text)?)
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Request body sent on both transports.
pub fn request_body(text: &str, today: NaiveDate) -> serde_json::Value {
    serde_json::json!({
        "content": text,
        "today": today.format("%Y-%m-%d").to_string(),
    })
}

#[async_trait]
impl ClassificationSource for HttpClassifier {
    async fn classify(&self, session: &Session, text: &str, today: NaiveDate) -> ClassifierOutcome {
        let body = request_body(text, today);

        let primary = match self.call_managed(session, &body).await {
            Ok(result) => {
                debug!(transport = "managed", "capture classified");
                return ClassifierOutcome::Classified {
                    result,
                    transport: Transport::Managed,
                };
            }
            Err(e) => e,
        };
        warn!(error = %primary, "managed classifier call failed, trying direct");

        match self.call_direct(&body).await {
            Ok(result) => {
                debug!(transport = "direct", "capture classified");
                ClassifierOutcome::Classified {
                    result,
                    transport: Transport::Direct,
                }
            }
            Err(fallback) => {
                warn!(error = %fallback, "direct classifier call failed");
                ClassifierOutcome::Unavailable {
                    reason: format!("managed: {}; direct: {}", primary, fallback),
                }
            }
        }
    }
}

/// Used when no classifier is configured. Every capture takes the defaults path.
pub struct DisabledClassifier;

#[async_trait]
impl ClassificationSource for DisabledClassifier {
    async fn classify(
        &self,
        _session: &Session,
        _text: &str,
        _today: NaiveDate,
    ) -> ClassifierOutcome {
        ClassifierOutcome::Unavailable {
            reason: "classifier not configured".to_string(),
        }
    }
}

/// Create the [`ClassificationSource`] for this configuration.
pub fn create_classifier(config: &ClassifierConfig) -> Result<Box<dyn ClassificationSource>> {
    if config.is_enabled() {
        Ok(Box::new(HttpClassifier::new(config)?))
    } else {
        Ok(Box::new(DisabledClassifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = request_body("ler livro", NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(body["content"], "ler livro");
        assert_eq!(body["today"], "2024-03-11");
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(500);
        let cut = truncate(&long);
        assert_eq!(cut.len(), MAX_ERROR_BODY + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("  short  "), "short");
    }

    #[tokio::test]
    async fn test_disabled_is_unavailable() {
        let classifier = create_classifier(&ClassifierConfig::default()).unwrap();
        let outcome = classifier
            .classify(
                &Session::new("u1"),
                "qualquer coisa",
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            )
            .await;
        assert!(matches!(outcome, ClassifierOutcome::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_network() {
        let config = ClassifierConfig {
            functions_url: Some("http://127.0.0.1:9/functions/v1".into()),
            ..Default::default()
        };
        let classifier = HttpClassifier {
            anon_key: None,
            ..HttpClassifier::new(&config).unwrap()
        };
        let body = request_body("x", NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        let err = classifier.call_direct(&body).await.unwrap_err();
        assert!(matches!(err, ClassifierError::MissingCredential(_)));
        let err = classifier
            .call_managed(&Session::new("u1"), &body)
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MissingCredential(_)));
    }
}
