//! HTTP routes registered with the host gateway.

use std::sync::Arc;

use {
    atypica_common::{Error, InboundMessage, Result},
    atypica_routing::{normalize_agent_id, session_key},
    atypica_sessions::{DEFAULT_HISTORY_LIMIT, history},
    axum::{
        Json, Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    serde::Deserialize,
    serde_json::json,
    tracing::info,
};

use crate::{
    auth,
    context::ChannelContext,
    dispatch::{self, InboundOutcome},
    error::error_response,
};

/// Build the channel's router for mounting into the host's HTTP server.
pub fn router(ctx: Arc<ChannelContext>) -> Router {
    Router::new()
        .route("/atypica/inbound", post(inbound_handler))
        .route("/atypica/messages", get(messages_handler))
        .with_state(ctx)
}

async fn inbound_handler(
    State(ctx): State<Arc<ChannelContext>>,
    headers: HeaderMap,
    Json(body): Json<InboundMessage>,
) -> Response {
    let presented = auth::presented_key(&headers);
    match dispatch::handle_inbound(&ctx, presented.as_deref(), body).await {
        Ok(InboundOutcome::Ack {
            session_key,
            agent_id,
        }) => {
            info!(session_key, agent_id, "inbound message accepted for async dispatch");
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "ok": true,
                    "mode": "async",
                    "message": "accepted; reply will be delivered via webhook",
                    "sessionKey": session_key,
                    "agentId": agent_id,
                })),
            )
                .into_response()
        },
        Ok(InboundOutcome::Reply {
            session_key,
            agent_id,
            reply,
        }) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "mode": "sync",
                "sessionKey": session_key,
                "agentId": agent_id,
                "reply": reply,
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    user_id: Option<String>,
    project_id: Option<String>,
    limit: Option<usize>,
    account_id: Option<String>,
}

async fn messages_handler(
    State(ctx): State<Arc<ChannelContext>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let presented = auth::presented_key(&headers);
    match fetch_history(&ctx, presented.as_deref(), query).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn fetch_history(
    ctx: &ChannelContext,
    presented: Option<&str>,
    query: HistoryQuery,
) -> Result<serde_json::Value> {
    let user_id = required_param(query.user_id.as_deref(), "userId")?;
    let project_id = required_param(query.project_id.as_deref(), "projectId")?;

    let effective = ctx.effective(query.account_id.as_deref()).await;
    auth::authorize(&effective, presented, user_id)?;

    let key = session_key(&normalize_agent_id(user_id), project_id);
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let messages = history(ctx.transcripts(), &key, limit).await?;

    Ok(json!({
        "ok": true,
        "userId": user_id,
        "projectId": project_id,
        "sessionKey": key,
        "messages": messages,
    }))
}

fn required_param<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(format!("{name} query parameter is required")))
}
