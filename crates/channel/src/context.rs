//! Explicit dependency context for the channel.
//!
//! Every host interface is injected at construction, so there is no global
//! runtime handle and no "not yet initialized" state to guard against.

use std::{sync::Arc, time::Duration};

use {
    atypica_common::{Error, Result},
    atypica_config::{AgentInvocationMode, AtypicaChannelConfig, EffectiveAccountConfig},
    atypica_host::{AgentRegistry, BindingStore, CliTurnRunner, RouteResolver, TurnRunner},
    atypica_sessions::TranscriptSource,
    tokio::sync::RwLock,
};

use crate::{
    dispatch::{DispatchQueue, TurnWorker},
    push::{ReplyPusher, WebhookPusher},
};

/// Host gateway capabilities handed to the plugin at registration.
pub struct HostInterfaces {
    pub agents: Arc<dyn AgentRegistry>,
    pub resolver: Arc<dyn RouteResolver>,
    pub bindings: Arc<dyn BindingStore>,
    pub runner: Arc<dyn TurnRunner>,
    pub transcripts: Arc<dyn TranscriptSource>,
}

/// Shared state behind every route handler.
pub struct ChannelContext {
    config: RwLock<AtypicaChannelConfig>,
    agents: Arc<dyn AgentRegistry>,
    resolver: Arc<dyn RouteResolver>,
    bindings: Arc<dyn BindingStore>,
    transcripts: Arc<dyn TranscriptSource>,
    runner: Arc<dyn TurnRunner>,
    pusher: Arc<dyn ReplyPusher>,
    queue: DispatchQueue,
    turn_timeout: Duration,
}

impl ChannelContext {
    /// Build a context with the default webhook pusher.
    pub fn new(config: AtypicaChannelConfig, host: HostInterfaces) -> Result<Arc<Self>> {
        Self::with_pusher(config, host, Arc::new(WebhookPusher::new()))
    }

    /// Build a context with an explicit pusher (tests inject counters here).
    pub fn with_pusher(
        config: AtypicaChannelConfig,
        host: HostInterfaces,
        pusher: Arc<dyn ReplyPusher>,
    ) -> Result<Arc<Self>> {
        let runner: Arc<dyn TurnRunner> = match config.agent.mode {
            AgentInvocationMode::Host => Arc::clone(&host.runner),
            AgentInvocationMode::Cli => Arc::new(
                CliTurnRunner::new(config.agent.cli_command.clone())
                    .map_err(|e| Error::validation(e.to_string()))?,
            ),
        };

        let turn_timeout = Duration::from_secs(config.agent.turn_timeout_secs.max(1));
        let queue = DispatchQueue::spawn(
            config.agent.queue_capacity,
            config.agent.max_concurrent_turns,
            TurnWorker {
                runner: Arc::clone(&runner),
                pusher: Arc::clone(&pusher),
                timeout: turn_timeout,
            },
        );

        Ok(Arc::new(Self {
            config: RwLock::new(config),
            agents: host.agents,
            resolver: host.resolver,
            bindings: host.bindings,
            transcripts: host.transcripts,
            runner,
            pusher,
            queue,
            turn_timeout,
        }))
    }

    /// Resolve the effective config for an account from the current snapshot.
    pub async fn effective(&self, account_id: Option<&str>) -> EffectiveAccountConfig {
        atypica_config::resolve(&*self.config.read().await, account_id)
    }

    /// Replace the channel config in place (hot update). Queue sizing and
    /// the turn timeout are fixed at construction.
    pub async fn update_config(&self, config: AtypicaChannelConfig) {
        *self.config.write().await = config;
    }

    pub async fn config_snapshot(&self) -> AtypicaChannelConfig {
        self.config.read().await.clone()
    }

    pub fn agents(&self) -> &dyn AgentRegistry {
        self.agents.as_ref()
    }

    pub fn resolver(&self) -> &dyn RouteResolver {
        self.resolver.as_ref()
    }

    pub fn bindings(&self) -> &dyn BindingStore {
        self.bindings.as_ref()
    }

    pub fn transcripts(&self) -> &dyn TranscriptSource {
        self.transcripts.as_ref()
    }

    pub fn runner(&self) -> &dyn TurnRunner {
        self.runner.as_ref()
    }

    pub fn pusher(&self) -> &dyn ReplyPusher {
        self.pusher.as_ref()
    }

    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }
}
