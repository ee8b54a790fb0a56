//! End-to-end tests for the inbound and history routes, using in-memory
//! host interfaces and a real listener.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    io::Write,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    anyhow::Result as AnyResult,
    async_trait::async_trait,
    atypica_channel::{ChannelContext, HostInterfaces, PushOutcome, ReplyPusher, router},
    atypica_common::ReplyPayload,
    atypica_config::{AccountOverrides, AtypicaChannelConfig, EffectiveAccountConfig},
    atypica_host::{AgentRegistry, MemoryAgentRegistry, MemoryRouting, TurnRunner},
    atypica_sessions::JsonlTranscripts,
    secrecy::Secret,
    serde_json::{Value, json},
    tokio::net::TcpListener,
};

struct EchoRunner;

#[async_trait]
impl TurnRunner for EchoRunner {
    async fn run_turn(
        &self,
        _agent_id: &str,
        _session_key: &str,
        message: &str,
    ) -> AnyResult<String> {
        Ok(format!("echo: {message}"))
    }
}

struct FailingRunner;

#[async_trait]
impl TurnRunner for FailingRunner {
    async fn run_turn(&self, _: &str, _: &str, _: &str) -> AnyResult<String> {
        anyhow::bail!("model backend unavailable")
    }
}

#[derive(Default)]
struct CountingPusher {
    pushes: AtomicUsize,
    payloads: Mutex<Vec<ReplyPayload>>,
}

#[async_trait]
impl ReplyPusher for CountingPusher {
    async fn push(&self, _: &EffectiveAccountConfig, payload: &ReplyPayload) -> PushOutcome {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());
        PushOutcome::delivered()
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    registry: Arc<MemoryAgentRegistry>,
    routing: Arc<MemoryRouting>,
    pusher: Arc<CountingPusher>,
    _transcripts_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start(config: AtypicaChannelConfig) -> Self {
        Self::start_with_runner(config, Arc::new(EchoRunner)).await
    }

    async fn start_with_runner(config: AtypicaChannelConfig, runner: Arc<dyn TurnRunner>) -> Self {
        let transcripts_dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(MemoryAgentRegistry::new());
        let routing = Arc::new(MemoryRouting::new("house-default"));
        let pusher = Arc::new(CountingPusher::default());

        let host = HostInterfaces {
            agents: Arc::clone(&registry) as _,
            resolver: Arc::clone(&routing) as _,
            bindings: Arc::clone(&routing) as _,
            runner,
            transcripts: Arc::new(JsonlTranscripts::new(transcripts_dir.path().to_path_buf())),
        };
        let ctx = ChannelContext::with_pusher(config, host, Arc::clone(&pusher) as _).unwrap();
        let app = router(ctx);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            registry,
            routing,
            pusher,
            _transcripts_dir: transcripts_dir,
        }
    }

    async fn post_inbound(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/atypica/inbound", self.base_url))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    fn write_transcript(&self, key: &str, lines: &[&str]) {
        let path = self
            ._transcripts_dir
            .path()
            .join(format!("{}.jsonl", JsonlTranscripts::key_to_filename(key)));
        let mut file = std::fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    async fn wait_for_pushes(&self, expected: usize) {
        for _ in 0..200 {
            if self.pusher.pushes.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} webhook pushes, saw {}",
            self.pusher.pushes.load(Ordering::SeqCst)
        );
    }
}

fn inbound(user: &str, project: &str, message: &str) -> Value {
    json!({ "userId": user, "projectId": project, "message": message })
}

#[tokio::test]
async fn async_inbound_acks_then_delivers_via_webhook() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    let response = server.post_inbound(inbound("u1", "p1", "hi")).await;
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["mode"], "async");
    assert_eq!(body["sessionKey"], "agent:u1:p1");
    assert_eq!(body["agentId"], "u1");

    server.wait_for_pushes(1).await;
    let payloads = server.pusher.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].text, "echo: hi");
    assert_eq!(payloads[0].user_id, "u1");
    assert_eq!(payloads[0].project_id, "p1");
}

#[tokio::test]
async fn sync_inbound_replies_inline_and_never_pushes() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    let mut body = inbound("u1", "p1", "hi");
    body["responseMode"] = json!("sync");
    let response = server.post_inbound(body).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["mode"], "sync");
    assert_eq!(body["reply"], "echo: hi");
    assert_eq!(body["sessionKey"], "agent:u1:p1");

    // Sync responses bypass webhook delivery entirely.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.pusher.pushes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn agent_id_is_normalized_from_user_id() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    let response = server.post_inbound(inbound("U1!", "p1", "hi")).await;
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["agentId"], "u1-");
    assert_eq!(body["sessionKey"], "agent:u1-:p1");

    // The agent was provisioned under the normalized id.
    server.wait_for_pushes(1).await;
    assert_eq!(
        server.registry.list_agent_ids().await.unwrap(),
        vec!["u1-"]
    );
}

#[tokio::test]
async fn repeated_inbound_is_deterministic_and_binds_once() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    let first = server.post_inbound(inbound("u1", "p1", "one")).await;
    let second = server.post_inbound(inbound("u1", "p1", "two")).await;
    let first: Value = first.json().await.unwrap();
    let second: Value = second.json().await.unwrap();

    assert_eq!(first["sessionKey"], second["sessionKey"]);
    assert_eq!(server.routing.upserts(), 1);
    assert_eq!(server.routing.binding_count().await, 1);
    assert_eq!(server.registry.creates(), 1);
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    for body in [
        json!({ "userId": "u1", "projectId": "p1" }),
        json!({ "userId": "u1", "message": "hi" }),
        json!({ "projectId": "p1", "message": "hi" }),
        json!({ "userId": "  ", "projectId": "p1", "message": "hi" }),
    ] {
        let response = server.post_inbound(body).await;
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["ok"], false);
    }
}

#[tokio::test]
async fn inbound_api_key_is_enforced_when_configured() {
    let config = AtypicaChannelConfig {
        inbound_api_key: Some(Secret::new("sekret".into())),
        ..Default::default()
    };
    let server = TestServer::start(config).await;
    let url = format!("{}/atypica/inbound", server.base_url);

    // No credentials.
    let response = server.post_inbound(inbound("u1", "p1", "hi")).await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);

    // Wrong bearer token.
    let response = server
        .client
        .post(&url)
        .bearer_auth("wrong")
        .json(&inbound("u1", "p1", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Correct bearer token.
    let response = server
        .client
        .post(&url)
        .bearer_auth("sekret")
        .json(&inbound("u1", "p1", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    // Correct X-API-Key header.
    let response = server
        .client
        .post(&url)
        .header("X-API-Key", "sekret")
        .json(&inbound("u1", "p1", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn allow_list_gates_inbound_senders() {
    let config = AtypicaChannelConfig {
        allow_from: vec!["alice".into()],
        ..Default::default()
    };
    let server = TestServer::start(config).await;

    let response = server.post_inbound(inbound("mallory", "p1", "hi")).await;
    assert_eq!(response.status(), 403);

    let response = server.post_inbound(inbound("Alice", "p1", "hi")).await;
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn disabled_account_is_forbidden() {
    let mut config = AtypicaChannelConfig::default();
    config.accounts.insert(
        "acme".into(),
        AccountOverrides {
            enabled: Some(false),
            ..Default::default()
        },
    );
    let server = TestServer::start(config).await;

    let mut body = inbound("u1", "p1", "hi");
    body["accountId"] = json!("acme");
    let response = server.post_inbound(body).await;
    assert_eq!(response.status(), 403);

    // Other accounts are unaffected.
    let response = server.post_inbound(inbound("u1", "p1", "hi")).await;
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn sync_turn_failure_surfaces_as_structured_error() {
    let server = TestServer::start_with_runner(
        AtypicaChannelConfig::default(),
        Arc::new(FailingRunner),
    )
    .await;

    let mut body = inbound("u1", "p1", "hi");
    body["responseMode"] = json!("sync");
    let response = server.post_inbound(body).await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(
        body["error"].as_str().unwrap().contains("model backend unavailable"),
        "error should carry the underlying failure: {body}"
    );
}

#[tokio::test]
async fn history_returns_turns_since_last_user_message() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;
    server.write_transcript(
        "agent:u1:p1",
        &[
            r#"{"role":"user","content":"hi"}"#,
            r#"{"role":"assistant","content":"hello"}"#,
            r#"{"role":"user","content":"bye"}"#,
            r#"{"role":"assistant","content":"cya"}"#,
        ],
    );

    let response = server
        .client
        .get(format!(
            "{}/atypica/messages?userId=u1&projectId=p1",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["sessionKey"], "agent:u1:p1");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "cya");
    assert_eq!(messages[0]["role"], "assistant");
}

#[tokio::test]
async fn history_limit_keeps_most_recent_entries() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;
    server.write_transcript(
        "agent:u1:p1",
        &[
            r#"{"role":"user","content":"go"}"#,
            r#"{"role":"assistant","content":"one"}"#,
            r#"{"role":"assistant","content":"two"}"#,
        ],
    );

    let response = server
        .client
        .get(format!(
            "{}/atypica/messages?userId=u1&projectId=p1&limit=1",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "two");
}

#[tokio::test]
async fn history_for_unknown_session_is_not_found() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    let response = server
        .client
        .get(format!(
            "{}/atypica/messages?userId=ghost&projectId=p1",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn history_requires_user_and_project_params() {
    let server = TestServer::start(AtypicaChannelConfig::default()).await;

    for query in ["userId=u1", "projectId=p1", ""] {
        let response = server
            .client
            .get(format!("{}/atypica/messages?{query}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "query: {query}");
    }
}
