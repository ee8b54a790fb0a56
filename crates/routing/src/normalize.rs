//! External user id → internal agent id normalization.

/// Derive a stable internal agent id from an arbitrary external user id.
///
/// Lowercases the trimmed input and replaces every character outside
/// `[a-z0-9_-]` with `-`. Replacement never deletes characters, so any
/// non-empty input yields a non-empty output.
///
/// The mapping is NOT injective: distinct user ids can collapse onto the
/// same agent id (e.g. `"U1"` and `"u-1"` both map near `"u-1"` shapes).
/// That is accepted multi-alias behavior, detectable via [`collides`], not
/// something this layer rejects.
#[must_use]
pub fn normalize_agent_id(user_id: &str) -> String {
    user_id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}

/// True when two external user ids normalize to the same agent id.
#[must_use]
pub fn collides(a: &str, b: &str) -> bool {
    normalize_agent_id(a) == normalize_agent_id(b)
}
