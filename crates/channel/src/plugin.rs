//! Plugin descriptor handed to the host gateway at registration.

use std::sync::Arc;

use {
    atypica_config::{AccountSummary, CHANNEL_ID, list_account_ids},
    axum::Router,
    serde::Serialize,
};

use crate::context::ChannelContext;

/// The atypica channel plugin: identity, routes, and account health.
pub struct AtypicaPlugin {
    ctx: Arc<ChannelContext>,
}

impl AtypicaPlugin {
    #[must_use]
    pub fn new(ctx: Arc<ChannelContext>) -> Self {
        Self { ctx }
    }

    /// Channel identifier.
    #[must_use]
    pub fn id(&self) -> &'static str {
        CHANNEL_ID
    }

    /// Human-readable channel name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "Atypica"
    }

    /// The channel's HTTP routes, for mounting by the host.
    #[must_use]
    pub fn router(&self) -> Router {
        crate::routes::router(Arc::clone(&self.ctx))
    }

    #[must_use]
    pub fn context(&self) -> Arc<ChannelContext> {
        Arc::clone(&self.ctx)
    }

    /// Configured account ids, default first when present.
    pub async fn account_ids(&self) -> Vec<String> {
        list_account_ids(&self.ctx.config_snapshot().await)
    }

    /// Configuration-derived health for one account. No network probe; the
    /// webhook is only exercised by actual deliveries.
    pub async fn probe(&self, account_id: &str) -> ChannelHealth {
        let effective = self.ctx.effective(Some(account_id)).await;
        let summary = AccountSummary::from(&effective);
        let details = if !summary.enabled {
            Some("account disabled".to_string())
        } else if !summary.webhook_configured {
            Some("no webhook url; async replies cannot be delivered".to_string())
        } else {
            None
        };
        ChannelHealth {
            account_id: summary.account_id.clone(),
            ready: summary.enabled,
            details,
            summary,
        }
    }
}

/// Config-derived account health snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelHealth {
    pub account_id: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub summary: AccountSummary,
}
