//! The caller-visible conversation window.

use {
    atypica_common::{Error, Result},
    serde::Serialize,
};

use crate::transcript::TranscriptSource;

/// Default cap on returned history entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One visible conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Read the visible history for `session_key`.
///
/// Returns `NotFound` when no transcript exists for the key.
pub async fn history(
    source: &dyn TranscriptSource,
    session_key: &str,
    limit: usize,
) -> Result<Vec<HistoryEntry>> {
    let records = source
        .read(session_key)
        .await
        .map_err(|e| Error::host("transcript read", e))?
        .ok_or_else(|| Error::not_found(format!("no session for key {session_key}")))?;
    Ok(window_since_last_user(&records, limit))
}

/// Trim a transcript to the turns produced since the caller's latest input.
///
/// Non-message records (no string `role`/`content`) are dropped, then only
/// messages strictly after the LAST `user` entry are kept; if no user
/// message exists the whole transcript is visible. The result is capped to
/// the `limit` most-recent entries. A plain "last N messages" tail is NOT
/// equivalent and callers depend on the difference.
#[must_use]
pub fn window_since_last_user(records: &[serde_json::Value], limit: usize) -> Vec<HistoryEntry> {
    let messages: Vec<HistoryEntry> = records.iter().filter_map(as_message).collect();
    let window = match messages.iter().rposition(|m| m.role == "user") {
        Some(last_user) => &messages[last_user + 1..],
        None => &messages[..],
    };
    let start = window.len().saturating_sub(limit);
    window[start..].to_vec()
}

fn as_message(record: &serde_json::Value) -> Option<HistoryEntry> {
    let role = record.get("role")?.as_str()?;
    let content = record.get("content")?.as_str()?;
    let timestamp = record
        .get("timestamp")
        .or_else(|| record.get("created_at"))
        .and_then(serde_json::Value::as_i64);
    Some(HistoryEntry {
        role: role.to_string(),
        content: content.to_string(),
        timestamp,
    })
}
