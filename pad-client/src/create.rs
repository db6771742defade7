//! Session creation.
//!
//! A new session is requested from the HTTP create endpoint, which answers
//! with `{"sessionId": "..."}`. The call sits behind [`SessionCreator`] so
//! the event loop can be tested without a server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use livepad_types::SessionId;
use serde::Deserialize;
use thiserror::Error;

use crate::client::ClientError;
use crate::config::ClientConfig;

/// Session creation errors.
#[derive(Debug, Error)]
pub enum SessionCreateError {
    /// The request failed or the server answered with an error status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response did not carry a usable session id.
    #[error("server returned no session id")]
    MissingSessionId,

    /// The creator could not be reached.
    #[error("session service unavailable: {0}")]
    Unavailable(String),
}

/// Something that can create a new session.
#[async_trait]
pub trait SessionCreator: Send + Sync + 'static {
    /// Ask for a new session and return its id.
    async fn create_session(&self) -> Result<SessionId, SessionCreateError>;
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "sessionId")]
    session_id: SessionId,
}

/// [`SessionCreator`] backed by `POST {http_base}/coding/create`.
#[derive(Debug, Clone)]
pub struct HttpSessionCreator {
    http: reqwest::Client,
    url: String,
}

impl HttpSessionCreator {
    /// Build a creator for the configured HTTP base.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.connect_timeout)
            .build()
            .map_err(SessionCreateError::Http)?;
        Ok(Self {
            http,
            url: config.create_url()?,
        })
    }

    /// The endpoint this creator posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SessionCreator for HttpSessionCreator {
    async fn create_session(&self) -> Result<SessionId, SessionCreateError> {
        tracing::debug!(url = %self.url, "requesting new session");
        let response: CreateResponse = self
            .http
            .post(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .session_id
            .explicit()
            .ok_or(SessionCreateError::MissingSessionId)
    }
}

/// Scripted [`SessionCreator`] for testing.
///
/// Answers are returned in the order they were queued; with nothing queued
/// the call fails as unavailable.
#[derive(Debug, Default, Clone)]
pub struct MockSessionCreator {
    inner: Arc<Mutex<MockCreatorInner>>,
}

#[derive(Debug, Default)]
struct MockCreatorInner {
    answers: VecDeque<Result<SessionId, String>>,
    calls: usize,
}

impl MockSessionCreator {
    /// Create a creator with no scripted answers.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockCreatorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful answer.
    pub fn respond_with(&self, session: &str) {
        self.lock().answers.push_back(Ok(SessionId::new(session)));
    }

    /// Queue a failure.
    pub fn fail_with(&self, error: &str) {
        self.lock().answers.push_back(Err(error.to_string()));
    }

    /// Number of create calls made.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }
}

#[async_trait]
impl SessionCreator for MockSessionCreator {
    async fn create_session(&self) -> Result<SessionId, SessionCreateError> {
        let mut inner = self.lock();
        inner.calls += 1;
        match inner.answers.pop_front() {
            Some(Ok(session)) => Ok(session),
            Some(Err(error)) => Err(SessionCreateError::Unavailable(error)),
            None => Err(SessionCreateError::Unavailable("no scripted answer".into())),
        }
    }
}
