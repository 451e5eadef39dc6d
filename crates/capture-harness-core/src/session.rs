//! Authenticated session passed explicitly into the pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    /// Bearer token for the managed classifier invocation, if the session has one.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// A session with a blank user id is not an authenticated session.
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}
