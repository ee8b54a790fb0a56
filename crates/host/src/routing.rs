use {anyhow::Result, async_trait::async_trait};

use crate::binding::Peer;

/// How a route was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// An explicit peer-level binding.
    PeerBinding,
    /// The channel/account default rule.
    Default,
    /// The host's last-resort fallback agent.
    Fallback,
}

/// Resolver answer: which agent handles this peer and how it was matched.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub agent_id: String,
    pub matched: RouteMatch,
}

/// The host gateway's peer → agent resolver.
#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve_route(
        &self,
        channel: &str,
        account_id: &str,
        peer: &Peer,
    ) -> Result<ResolvedRoute>;
}
