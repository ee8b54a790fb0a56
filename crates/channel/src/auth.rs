//! Inbound authentication and sender gating.

use {
    atypica_common::{Error, Result},
    atypica_config::EffectiveAccountConfig,
    axum::http::{HeaderMap, header},
    secrecy::ExposeSecret,
};

/// Extract the presented API key from `Authorization: Bearer <key>` or the
/// `X-API-Key` header.
#[must_use]
pub fn presented_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

/// Authorize an inbound request against the resolved account config.
///
/// No configured `inbound_api_key` means no auth check (backward
/// compatibility with pre-auth deployments). All checks run before any side
/// effect.
pub fn authorize(
    effective: &EffectiveAccountConfig,
    presented: Option<&str>,
    sender: &str,
) -> Result<()> {
    if !effective.enabled {
        return Err(Error::forbidden(format!(
            "account {} is disabled",
            effective.account_id
        )));
    }

    if let Some(required) = &effective.inbound_api_key {
        let presented = presented.unwrap_or("");
        if presented.is_empty() || presented != required.expose_secret() {
            return Err(Error::auth("missing or invalid API key"));
        }
    }

    if !sender_allowed(sender, &effective.allow_from) {
        return Err(Error::forbidden(format!(
            "sender {sender} is not on the allow-list"
        )));
    }

    Ok(())
}

/// Check a sender against the account allow-list.
///
/// An empty list allows everyone. Entries are matched case-insensitively
/// and support glob-style `*` wildcards, so a bare `*` entry also allows
/// everyone.
#[must_use]
pub fn sender_allowed(sender: &str, allow_from: &[String]) -> bool {
    if allow_from.is_empty() {
        return true;
    }
    let sender = sender.to_lowercase();
    allow_from.iter().any(|pattern| {
        let pat = pattern.to_lowercase();
        if pat.contains('*') {
            glob_match(&pat, &sender)
        } else {
            pat == sender
        }
    })
}

/// Simple glob matching supporting `*` as a wildcard for any sequence.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(idx) => {
                // First segment must match at the start.
                if i == 0 && idx != 0 {
                    return false;
                }
                pos += idx + part.len();
            },
            None => return false,
        }
    }
    // Last segment must match at the end (unless the pattern ends with *).
    if !parts.last().copied().unwrap_or_default().is_empty() {
        pos == text.len()
    } else {
        true
    }
}
