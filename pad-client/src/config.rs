//! Client configuration and the URLs derived from it.

use std::time::Duration;

use livepad_core::DEFAULT_QUEUE_CAPACITY;
use livepad_types::SessionId;
use reqwest::Url;

use crate::client::ClientError;

/// Configuration for [`PadClient`](crate::PadClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket base, e.g. `ws://localhost:8080`.
    pub ws_base: String,
    /// HTTP base for the create endpoint, e.g. `http://localhost:8080`.
    pub http_base: String,
    /// Page that share links point at.
    pub page_url: String,
    /// Session to join; `None` joins the implicit shared session.
    pub session_id: Option<SessionId>,
    /// Name announced after every `init`, if set.
    pub display_name: Option<String>,
    /// Interval between outbound queue drains.
    pub drain_interval: Duration,
    /// Fixed delay before reconnecting after a transport failure.
    pub reconnect_delay: Duration,
    /// Delay between adopting a freshly created session and joining it.
    pub settle_delay: Duration,
    /// Upper bound on a single transport open.
    pub connect_timeout: Duration,
    /// Outbound queue bound.
    pub queue_capacity: usize,
}

impl ClientConfig {
    /// Create a configuration for the given WebSocket and HTTP bases.
    pub fn new(ws_base: &str, http_base: &str) -> Self {
        let http_base = http_base.trim_end_matches('/').to_string();
        Self {
            ws_base: ws_base.trim_end_matches('/').to_string(),
            page_url: format!("{http_base}/coding/"),
            http_base,
            session_id: None,
            display_name: None,
            drain_interval: Duration::from_millis(50),
            reconnect_delay: Duration::from_secs(3),
            settle_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Join a specific session. The `"default"` sentinel means none.
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session_id = session.explicit();
        self
    }

    /// Set the page that share links point at.
    pub fn with_page_url(mut self, url: &str) -> Self {
        self.page_url = url.to_string();
        self
    }

    /// Announce this display name after joining.
    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    /// Set the drain interval.
    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    /// Set the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the post-create settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the outbound queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Check that every derived URL parses and intervals are non-zero.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.connect_url(None)?;
        self.create_url()?;
        self.share_url(None)?;
        if self.drain_interval.is_zero() {
            return Err(ClientError::InvalidConfig("drain_interval must be non-zero".into()));
        }
        Ok(())
    }

    /// WebSocket URL for joining `session` (or the implicit session).
    pub fn connect_url(&self, session: Option<&SessionId>) -> Result<String, ClientError> {
        with_session(&format!("{}/coding/connect/", self.ws_base), session)
    }

    /// Endpoint that creates a new session.
    pub fn create_url(&self) -> Result<String, ClientError> {
        let url = parse(&format!("{}/coding/create", self.http_base))?;
        Ok(url.into())
    }

    /// Shareable page link for `session`.
    pub fn share_url(&self, session: Option<&SessionId>) -> Result<String, ClientError> {
        with_session(&self.page_url, session)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("ws://localhost:8080", "http://localhost:8080")
    }
}

fn parse(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|e| ClientError::InvalidConfig(format!("{raw}: {e}")))
}

fn with_session(base: &str, session: Option<&SessionId>) -> Result<String, ClientError> {
    let mut url = parse(base)?;
    if let Some(session) = session.filter(|s| !s.is_default()) {
        url.query_pairs_mut().append_pair("sessionId", session.as_str());
    }
    Ok(url.into())
}
