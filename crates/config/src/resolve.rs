//! Effective account configuration.
//!
//! Resolution is total: every account id, including unknown ones, yields a
//! fully-populated config by falling back from account override to base
//! channel field to environment variable to hard default.

use {
    secrecy::Secret,
    serde::Serialize,
};

use crate::schema::{AtypicaChannelConfig, DEFAULT_ACCOUNT_ID};

/// Environment fallbacks, consulted only when neither the account nor the
/// base config sets the corresponding field.
pub const ENV_WEBHOOK_URL: &str = "ATYPICA_WEBHOOK_URL";
pub const ENV_API_SECRET: &str = "ATYPICA_API_SECRET";
pub const ENV_INBOUND_API_KEY: &str = "ATYPICA_INBOUND_API_KEY";

/// Fully-resolved configuration for one account.
#[derive(Clone)]
pub struct EffectiveAccountConfig {
    pub account_id: String,
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub api_secret: Option<Secret<String>>,
    pub inbound_api_key: Option<Secret<String>>,
    pub allow_from: Vec<String>,
}

impl std::fmt::Debug for EffectiveAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveAccountConfig")
            .field("account_id", &self.account_id)
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

/// Resolve the effective config for `account_id`, reading fallbacks from the
/// process environment.
#[must_use]
pub fn resolve(config: &AtypicaChannelConfig, account_id: Option<&str>) -> EffectiveAccountConfig {
    resolve_with_env(config, account_id, |name| std::env::var(name).ok())
}

/// Resolve with an injected environment lookup. Pure given `env`.
#[must_use]
pub fn resolve_with_env(
    config: &AtypicaChannelConfig,
    account_id: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> EffectiveAccountConfig {
    let id = account_id
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ACCOUNT_ID);
    let account = config.accounts.get(id);

    let webhook_url = account
        .and_then(|a| a.webhook_url.clone())
        .or_else(|| config.webhook_url.clone())
        .or_else(|| env(ENV_WEBHOOK_URL));
    let api_secret = account
        .and_then(|a| a.api_secret.clone())
        .or_else(|| config.api_secret.clone())
        .or_else(|| env(ENV_API_SECRET).map(Secret::new));
    let inbound_api_key = account
        .and_then(|a| a.inbound_api_key.clone())
        .or_else(|| config.inbound_api_key.clone())
        .or_else(|| env(ENV_INBOUND_API_KEY).map(Secret::new));

    EffectiveAccountConfig {
        account_id: id.to_string(),
        enabled: account.and_then(|a| a.enabled).unwrap_or(config.enabled),
        webhook_url,
        api_secret,
        inbound_api_key,
        allow_from: account
            .and_then(|a| a.allow_from.clone())
            .unwrap_or_else(|| config.allow_from.clone()),
    }
}

/// List the configured account ids, default id first when present.
///
/// The base channel config counts as the default account when it carries any
/// override; explicit keys under `accounts` are always included.
#[must_use]
pub fn list_account_ids(config: &AtypicaChannelConfig) -> Vec<String> {
    let mut ids = Vec::new();
    if config.has_base_override() || config.accounts.contains_key(DEFAULT_ACCOUNT_ID) {
        ids.push(DEFAULT_ACCOUNT_ID.to_string());
    }
    let mut rest: Vec<String> = config
        .accounts
        .keys()
        .filter(|id| id.as_str() != DEFAULT_ACCOUNT_ID)
        .cloned()
        .collect();
    rest.sort();
    ids.extend(rest);
    ids
}

/// Serializable summary of an account, with secrets reduced to presence flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub enabled: bool,
    pub webhook_configured: bool,
    pub inbound_auth_required: bool,
    pub allow_from: Vec<String>,
}

impl From<&EffectiveAccountConfig> for AccountSummary {
    fn from(effective: &EffectiveAccountConfig) -> Self {
        Self {
            account_id: effective.account_id.clone(),
            enabled: effective.enabled,
            webhook_configured: effective.webhook_url.is_some(),
            inbound_auth_required: effective.inbound_api_key.is_some(),
            allow_from: effective.allow_from.clone(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::AccountOverrides, secrecy::ExposeSecret};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn base_config() -> AtypicaChannelConfig {
        AtypicaChannelConfig {
            webhook_url: Some("https://base.example/hook".into()),
            api_secret: Some(Secret::new("base-secret".into())),
            allow_from: vec!["alice".into()],
            ..Default::default()
        }
    }

    #[test]
    fn unknown_account_resolves_to_base_values() {
        let cfg = base_config();
        let effective = resolve_with_env(&cfg, Some("nobody-configured-this"), no_env);
        assert_eq!(effective.account_id, "nobody-configured-this");
        assert!(effective.enabled);
        assert_eq!(effective.webhook_url.as_deref(), Some("https://base.example/hook"));
        assert_eq!(effective.allow_from, vec!["alice"]);
    }

    #[test]
    fn missing_account_id_uses_default() {
        let cfg = AtypicaChannelConfig::default();
        assert_eq!(resolve_with_env(&cfg, None, no_env).account_id, DEFAULT_ACCOUNT_ID);
        assert_eq!(resolve_with_env(&cfg, Some("  "), no_env).account_id, DEFAULT_ACCOUNT_ID);
    }

    #[test]
    fn account_fields_override_base() {
        let mut cfg = base_config();
        cfg.accounts.insert(
            "acme".into(),
            AccountOverrides {
                enabled: Some(false),
                webhook_url: Some("https://acme.example/hook".into()),
                allow_from: Some(vec![]),
                ..Default::default()
            },
        );
        let effective = resolve_with_env(&cfg, Some("acme"), no_env);
        assert!(!effective.enabled);
        assert_eq!(effective.webhook_url.as_deref(), Some("https://acme.example/hook"));
        // Explicit empty allow-list overrides the base list.
        assert!(effective.allow_from.is_empty());
        // Unset override falls back to base.
        assert_eq!(effective.api_secret.unwrap().expose_secret(), "base-secret");
    }

    #[test]
    fn env_fallback_applies_only_when_unset() {
        let env = |name: &str| match name {
            ENV_WEBHOOK_URL => Some("https://env.example/hook".into()),
            ENV_INBOUND_API_KEY => Some("env-key".into()),
            _ => None,
        };
        let cfg = base_config();
        let effective = resolve_with_env(&cfg, None, env);
        // Config value wins over env.
        assert_eq!(effective.webhook_url.as_deref(), Some("https://base.example/hook"));
        // Unset field picks up the env fallback.
        assert_eq!(effective.inbound_api_key.unwrap().expose_secret(), "env-key");
    }

    #[test]
    fn list_account_ids_orders_default_first() {
        let mut cfg = base_config();
        cfg.accounts.insert("zeta".into(), AccountOverrides::default());
        cfg.accounts.insert("acme".into(), AccountOverrides::default());
        assert_eq!(list_account_ids(&cfg), vec!["default", "acme", "zeta"]);
    }

    #[test]
    fn list_account_ids_empty_without_overrides() {
        let cfg = AtypicaChannelConfig::default();
        assert!(list_account_ids(&cfg).is_empty());
    }

    #[test]
    fn account_summary_hides_secrets() {
        let cfg = base_config();
        let effective = resolve_with_env(&cfg, None, no_env);
        let summary = AccountSummary::from(&effective);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("base-secret"));
        assert!(json.contains("\"webhookConfigured\":true"));
    }
}
