//! Config schema types for the atypica channel.

use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Channel identifier used in session keys and binding records.
pub const CHANNEL_ID: &str = "atypica";

/// Reserved account id used when the caller does not name one.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Channel-level configuration with per-account overrides.
///
/// Field names match the JSON config surface
/// (`channels.atypica.{enabled, webhookUrl, apiSecret, ...}`).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtypicaChannelConfig {
    /// Whether the channel is enabled. Defaults to true.
    pub enabled: bool,

    /// Webhook URL for asynchronous reply delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Bearer token sent with outbound webhook posts.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_secret: Option<Secret<String>>,

    /// Bearer/token required on inbound requests. Unset means no auth check.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub inbound_api_key: Option<Secret<String>>,

    /// Permitted external user ids. Empty means everyone is allowed.
    pub allow_from: Vec<String>,

    /// Per-account overrides, keyed by account id.
    pub accounts: HashMap<String, AccountOverrides>,

    /// How agent turns are executed.
    pub agent: AgentInvocationConfig,
}

impl Default for AtypicaChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
            api_secret: None,
            inbound_api_key: None,
            allow_from: Vec::new(),
            accounts: HashMap::new(),
            agent: AgentInvocationConfig::default(),
        }
    }
}

impl std::fmt::Debug for AtypicaChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtypicaChannelConfig")
            .field("enabled", &self.enabled)
            .field("webhook_url", &self.webhook_url)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "inbound_api_key",
                &self.inbound_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allow_from", &self.allow_from)
            .field("accounts", &self.accounts)
            .field("agent", &self.agent)
            .finish()
    }
}

impl AtypicaChannelConfig {
    /// True when any base-level field carries an explicit value.
    #[must_use]
    pub fn has_base_override(&self) -> bool {
        self.webhook_url.is_some()
            || self.api_secret.is_some()
            || self.inbound_api_key.is_some()
            || !self.allow_from.is_empty()
    }
}

/// Per-account field overrides. Unset fields fall back to base values.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_secret: Option<Secret<String>>,
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub inbound_api_key: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_from: Option<Vec<String>>,
}

impl std::fmt::Debug for AccountOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountOverrides")
            .field("enabled", &self.enabled)
            .field("webhook_url", &self.webhook_url)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "inbound_api_key",
                &self.inbound_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allow_from", &self.allow_from)
            .finish()
    }
}

/// How agent turns are executed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentInvocationMode {
    /// Call the host gateway's in-process turn runner.
    #[default]
    Host,
    /// Spawn the configured command-line agent per turn.
    Cli,
}

/// Turn execution and dispatch-queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentInvocationConfig {
    pub mode: AgentInvocationMode,

    /// Argv for [`AgentInvocationMode::Cli`]; first element is the program.
    pub cli_command: Vec<String>,

    /// Upper bound on a single agent turn, in seconds.
    pub turn_timeout_secs: u64,

    /// Capacity of the async dispatch queue.
    pub queue_capacity: usize,

    /// Maximum number of concurrently running background turns.
    pub max_concurrent_turns: usize,
}

impl Default for AgentInvocationConfig {
    fn default() -> Self {
        Self {
            mode: AgentInvocationMode::default(),
            cli_command: Vec::new(),
            turn_timeout_secs: 120,
            queue_capacity: 64,
            max_concurrent_turns: 8,
        }
    }
}

fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = AtypicaChannelConfig::default();
        assert!(cfg.enabled);
        assert!(cfg.allow_from.is_empty());
        assert!(cfg.accounts.is_empty());
        assert_eq!(cfg.agent.turn_timeout_secs, 120);
        assert_eq!(cfg.agent.mode, AgentInvocationMode::Host);
        assert!(!cfg.has_base_override());
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "webhookUrl": "https://example.com/hook",
            "apiSecret": "s3cret",
            "allowFrom": ["u1", "u2"],
            "accounts": {
                "acme": { "inboundApiKey": "k", "enabled": false }
            },
            "agent": { "mode": "cli", "cliCommand": ["agent", "--quiet"] }
        }"#;
        let cfg: AtypicaChannelConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.enabled); // unset field keeps its default
        assert_eq!(cfg.webhook_url.as_deref(), Some("https://example.com/hook"));
        assert_eq!(cfg.api_secret.as_ref().unwrap().expose_secret(), "s3cret");
        assert_eq!(cfg.allow_from, vec!["u1", "u2"]);
        assert_eq!(cfg.accounts["acme"].enabled, Some(false));
        assert_eq!(cfg.agent.mode, AgentInvocationMode::Cli);
        assert_eq!(cfg.agent.cli_command, vec!["agent", "--quiet"]);
        assert!(cfg.has_base_override());
    }

    #[test]
    fn serialize_roundtrip_keeps_secrets() {
        let cfg = AtypicaChannelConfig {
            inbound_api_key: Some(Secret::new("key".into())),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: AtypicaChannelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.inbound_api_key.unwrap().expose_secret(), "key");
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = AtypicaChannelConfig {
            api_secret: Some(Secret::new("tok".into())),
            ..Default::default()
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("tok"));
        assert!(debug.contains("REDACTED"));
    }
}
