//! Outbound webhook delivery.

use {
    async_trait::async_trait,
    atypica_common::ReplyPayload,
    atypica_config::EffectiveAccountConfig,
    secrecy::ExposeSecret,
    tracing::debug,
};

/// Result of one delivery attempt. Failure is a value, not an exception;
/// callers log it and never retry.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub ok: bool,
    pub error: Option<String>,
}

impl PushOutcome {
    #[must_use]
    pub fn delivered() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Sink for outbound reply payloads.
#[async_trait]
pub trait ReplyPusher: Send + Sync {
    async fn push(&self, effective: &EffectiveAccountConfig, payload: &ReplyPayload)
    -> PushOutcome;
}

/// Pusher that POSTs the payload to the account's configured webhook.
pub struct WebhookPusher {
    client: reqwest::Client,
}

impl WebhookPusher {
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for WebhookPusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyPusher for WebhookPusher {
    async fn push(
        &self,
        effective: &EffectiveAccountConfig,
        payload: &ReplyPayload,
    ) -> PushOutcome {
        let Some(url) = effective.webhook_url.as_deref() else {
            return PushOutcome::failed(format!(
                "no webhook url configured for account {}",
                effective.account_id
            ));
        };

        debug!(account_id = %effective.account_id, "posting reply to webhook");

        let mut request = self.client.post(url).json(payload);
        if let Some(secret) = &effective.api_secret {
            request = request.bearer_auth(secret.expose_secret());
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => PushOutcome::delivered(),
            Ok(response) => {
                PushOutcome::failed(format!("webhook returned {}", response.status()))
            },
            Err(e) => PushOutcome::failed(format!("webhook request failed: {e}")),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {atypica_config::AtypicaChannelConfig, secrecy::Secret};

    use super::*;

    fn effective_with_webhook(url: Option<String>, secret: Option<&str>) -> EffectiveAccountConfig {
        let cfg = AtypicaChannelConfig {
            webhook_url: url,
            api_secret: secret.map(|s| Secret::new(s.to_string())),
            ..Default::default()
        };
        atypica_config::resolve_with_env(&cfg, None, |_| None)
    }

    fn payload() -> ReplyPayload {
        ReplyPayload::assistant("u1", "p1", "hello")
    }

    #[tokio::test]
    async fn missing_webhook_url_fails_without_request() {
        let pusher = WebhookPusher::new();
        let outcome = pusher.push(&effective_with_webhook(None, None), &payload()).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().contains("no webhook url"));
    }

    #[tokio::test]
    async fn successful_post_sends_bearer_auth_and_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("authorization", "Bearer outbound-secret")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let pusher = WebhookPusher::new();
        let effective =
            effective_with_webhook(Some(format!("{}/hook", server.url())), Some("outbound-secret"));
        let outcome = pusher.push(&effective, &payload()).await;

        assert!(outcome.ok, "push failed: {:?}", outcome.error);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_response_reports_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(500)
            .create_async()
            .await;

        let pusher = WebhookPusher::new();
        let effective = effective_with_webhook(Some(format!("{}/hook", server.url())), None);
        let outcome = pusher.push(&effective, &payload()).await;

        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().contains("500"));
    }

    #[tokio::test]
    async fn no_auth_header_when_secret_is_unset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(204)
            .create_async()
            .await;

        let pusher = WebhookPusher::new();
        let effective = effective_with_webhook(Some(format!("{}/hook", server.url())), None);
        let outcome = pusher.push(&effective, &payload()).await;

        assert!(outcome.ok);
        mock.assert_async().await;
    }
}
