//! The reply dispatcher.
//!
//! Inbound messages move through received → authorized → routed, then branch
//! on response mode: sync turns run inline and answer on the open HTTP
//! response; async turns are acked with 202 and flow through a bounded
//! dispatch queue to the outbound webhook. Exactly one delivery is attempted
//! per inbound message and failed webhook pushes are never retried.

use std::{sync::Arc, time::Duration};

use {
    atypica_common::{Error, InboundMessage, ReplyPayload, ResponseMode, Result},
    atypica_config::{CHANNEL_ID, EffectiveAccountConfig},
    atypica_host::TurnRunner,
    atypica_routing::{ensure_agent, normalize_agent_id, route_peer},
    tokio::sync::{Semaphore, mpsc},
    tracing::{debug, error, info, warn},
};

use crate::{auth, context::ChannelContext, push::ReplyPusher};

/// Outcome of an inbound request, before HTTP encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Async mode: accepted, reply will arrive via webhook.
    Ack {
        session_key: String,
        agent_id: String,
    },
    /// Sync mode: the agent's reply, delivered inline.
    Reply {
        session_key: String,
        agent_id: String,
        reply: String,
    },
}

/// A background turn accepted from an async inbound request.
pub struct TurnJob {
    pub agent_id: String,
    pub session_key: String,
    pub message: String,
    pub user_id: String,
    pub project_id: String,
    pub effective: EffectiveAccountConfig,
}

/// Runs queued turns and delivers their replies to the webhook.
pub struct TurnWorker {
    pub runner: Arc<dyn TurnRunner>,
    pub pusher: Arc<dyn ReplyPusher>,
    pub timeout: Duration,
}

impl TurnWorker {
    async fn process(&self, job: TurnJob) {
        match run_turn_with_timeout(
            self.runner.as_ref(),
            &job.agent_id,
            &job.session_key,
            &job.message,
            self.timeout,
        )
        .await
        {
            Ok(reply) => {
                let payload = ReplyPayload::assistant(&job.user_id, &job.project_id, reply);
                let outcome = self.pusher.push(&job.effective, &payload).await;
                if outcome.ok {
                    info!(session_key = %job.session_key, "reply delivered to webhook");
                } else {
                    warn!(
                        session_key = %job.session_key,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "webhook delivery failed; not retried"
                    );
                }
            },
            Err(e) => {
                // Post-ack failures are logged only; the caller learns of
                // them through history polling or webhook absence.
                error!(session_key = %job.session_key, error = %e, "background agent turn failed");
            },
        }
    }
}

/// Bounded work queue for background turns.
///
/// A single consumer task pulls jobs off an mpsc channel and runs each one
/// under a semaphore capping concurrent turns. Enqueueing applies
/// backpressure once the channel is full instead of spawning unbounded
/// tasks.
pub struct DispatchQueue {
    tx: mpsc::Sender<TurnJob>,
}

impl DispatchQueue {
    #[must_use]
    pub fn spawn(capacity: usize, max_concurrent: usize, worker: TurnWorker) -> Self {
        let (tx, mut rx) = mpsc::channel::<TurnJob>(capacity.max(1));
        let limiter = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let worker = Arc::new(worker);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
                    break;
                };
                let worker = Arc::clone(&worker);
                tokio::spawn(async move {
                    worker.process(job).await;
                    drop(permit);
                });
            }
        });

        Self { tx }
    }

    /// Number of jobs currently waiting in the queue.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Hand a job to the consumer, waiting for capacity when the queue is
    /// full (delays the 202 ack rather than refusing it).
    pub async fn enqueue(&self, job: TurnJob) -> Result<()> {
        debug!(
            session_key = %job.session_key,
            depth = self.depth(),
            "enqueueing background turn"
        );
        self.tx
            .send(job)
            .await
            .map_err(|_| Error::delivery("dispatch queue is closed"))
    }
}

/// Run one agent turn under the configured bound. Exceeding it is a turn
/// failure, not retried.
pub async fn run_turn_with_timeout(
    runner: &dyn TurnRunner,
    agent_id: &str,
    session_key: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, runner.run_turn(agent_id, session_key, message)).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(e)) => Err(Error::host("agent turn", e)),
        Err(_) => Err(Error::Timeout {
            secs: timeout.as_secs(),
        }),
    }
}

/// Drive one inbound message through validation, auth, routing, and
/// dispatch.
pub async fn handle_inbound(
    ctx: &ChannelContext,
    presented_key: Option<&str>,
    message: InboundMessage,
) -> Result<InboundOutcome> {
    let msg = message.validated()?;
    let effective = ctx.effective(msg.account_id.as_deref()).await;
    auth::authorize(&effective, presented_key, &msg.user_id)?;

    let agent_id = normalize_agent_id(&msg.user_id);
    ensure_agent(ctx.agents(), &agent_id, &msg.user_id).await?;

    let routed = route_peer(
        ctx.resolver(),
        ctx.bindings(),
        CHANNEL_ID,
        &effective.account_id,
        &msg.user_id,
        &msg.project_id,
    )
    .await?;

    match msg.response_mode {
        ResponseMode::Sync => {
            let reply = run_turn_with_timeout(
                ctx.runner(),
                &routed.agent_id,
                &routed.session_key,
                &msg.message,
                ctx.turn_timeout(),
            )
            .await?;
            Ok(InboundOutcome::Reply {
                session_key: routed.session_key,
                agent_id: routed.agent_id,
                reply,
            })
        },
        ResponseMode::Async => {
            ctx.queue()
                .enqueue(TurnJob {
                    agent_id: routed.agent_id.clone(),
                    session_key: routed.session_key.clone(),
                    message: msg.message,
                    user_id: msg.user_id,
                    project_id: msg.project_id,
                    effective,
                })
                .await?;
            Ok(InboundOutcome::Ack {
                session_key: routed.session_key,
                agent_id: routed.agent_id,
            })
        },
    }
}
