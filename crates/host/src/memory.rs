//! In-memory host implementations for tests and single-process embedding.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use {anyhow::Result, async_trait::async_trait, tokio::sync::RwLock};

use crate::{
    agents::AgentRegistry,
    binding::{BindingStore, Peer, PeerBinding},
    routing::{ResolvedRoute, RouteMatch, RouteResolver},
};

/// Agent registry backed by a plain list of ids.
#[derive(Default)]
pub struct MemoryAgentRegistry {
    agents: RwLock<Vec<String>>,
    creates: AtomicUsize,
    reloads: AtomicUsize,
}

impl MemoryAgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_agents(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            agents: RwLock::new(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Number of `create_agent` calls seen.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `reload` calls seen.
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRegistry for MemoryAgentRegistry {
    async fn list_agent_ids(&self) -> Result<Vec<String>> {
        Ok(self.agents.read().await.clone())
    }

    async fn create_agent(&self, agent_id: &str, _workspace: &str) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.agents.write().await.push(agent_id.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Combined resolver and binding store over a key → binding map.
///
/// Peers with an explicit binding resolve to it; everything else falls back
/// to the configured default agent.
pub struct MemoryRouting {
    default_agent_id: String,
    bindings: RwLock<HashMap<String, PeerBinding>>,
    upserts: AtomicUsize,
}

impl MemoryRouting {
    #[must_use]
    pub fn new(default_agent_id: impl Into<String>) -> Self {
        Self {
            default_agent_id: default_agent_id.into(),
            bindings: RwLock::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
        }
    }

    /// Number of `upsert` calls seen.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of distinct binding records currently stored.
    pub async fn binding_count(&self) -> usize {
        self.bindings.read().await.len()
    }
}

#[async_trait]
impl RouteResolver for MemoryRouting {
    async fn resolve_route(
        &self,
        channel: &str,
        account_id: &str,
        peer: &Peer,
    ) -> Result<ResolvedRoute> {
        let probe = PeerBinding {
            channel: channel.to_string(),
            account_id: account_id.to_string(),
            peer: peer.clone(),
            agent_id: String::new(),
        };
        let bindings = self.bindings.read().await;
        Ok(match bindings.get(&probe.key()) {
            Some(binding) => ResolvedRoute {
                agent_id: binding.agent_id.clone(),
                matched: RouteMatch::PeerBinding,
            },
            None => ResolvedRoute {
                agent_id: self.default_agent_id.clone(),
                matched: RouteMatch::Default,
            },
        })
    }
}

#[async_trait]
impl BindingStore for MemoryRouting {
    async fn upsert(&self, binding: PeerBinding) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.bindings.write().await.insert(binding.key(), binding);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PeerBinding>> {
        Ok(self.bindings.read().await.values().cloned().collect())
    }
}
