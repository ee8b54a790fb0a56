//! Wire types for the atypica channel.
//!
//! Field names follow the external JSON surface (camelCase), matching what
//! the web caller sends and what the webhook receives.

use serde::{Deserialize, Serialize};

/// Current unix time in milliseconds.
#[must_use]
pub fn unix_now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// How the reply is delivered back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Immediate 202 ack; reply arrives via the outbound webhook.
    #[default]
    Async,
    /// Reply embedded in the HTTP response; webhook is bypassed.
    Sync,
}

impl ResponseMode {
    /// Parse a caller-supplied mode string. Anything other than "sync"
    /// (trimmed, case-insensitive) falls back to async.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("sync") => Self::Sync,
            _ => Self::Async,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Async => "async",
            Self::Sync => "sync",
        }
    }
}

/// Inbound message envelope as posted by the web caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InboundMessage {
    pub user_id: String,
    pub project_id: String,
    pub message: String,
    pub account_id: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<i64>,
    pub response_mode: Option<String>,
}

impl InboundMessage {
    /// Trim and validate the required fields.
    pub fn validated(self) -> crate::Result<ValidInbound> {
        let user_id = self.user_id.trim();
        let project_id = self.project_id.trim();
        let message = self.message.trim();
        if user_id.is_empty() || project_id.is_empty() || message.is_empty() {
            return Err(crate::Error::validation(
                "userId, projectId and message are required",
            ));
        }
        let account_id = self
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        Ok(ValidInbound {
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            message: message.to_string(),
            account_id,
            message_id: self.message_id,
            response_mode: ResponseMode::parse(self.response_mode.as_deref()),
        })
    }
}

/// An inbound message after trimming and validation.
#[derive(Debug, Clone)]
pub struct ValidInbound {
    pub user_id: String,
    pub project_id: String,
    pub message: String,
    pub account_id: Option<String>,
    pub message_id: Option<String>,
    pub response_mode: ResponseMode,
}

/// Kind of an outbound reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// A regular agent reply.
    Assistant,
    /// A notice produced by the channel itself rather than the agent.
    System,
}

/// Outbound reply payload posted to the configured webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    pub user_id: String,
    pub project_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub timestamp: i64,
}

impl ReplyPayload {
    #[must_use]
    pub fn assistant(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            text: text.into(),
            kind: ReplyKind::Assistant,
            timestamp: unix_now_ms(),
        }
    }
}
