//! Session routing: peer → agent resolution with lazy binding creation.

use {
    atypica_common::{Error, Result},
    atypica_host::{BindingStore, Peer, PeerBinding, RouteMatch, RouteResolver},
    tracing::{debug, info},
};

use crate::normalize::normalize_agent_id;

/// Deterministic session key for a routed conversation.
#[must_use]
pub fn session_key(agent_id: &str, project_id: &str) -> String {
    format!("agent:{agent_id}:{project_id}")
}

/// A peer routed to its agent and session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedPeer {
    pub agent_id: String,
    pub session_key: String,
    pub account_id: String,
}

/// Resolve the agent and session key for `(user_id, project_id)`.
///
/// Delegates to the host resolver; when the answer does not match the
/// expected normalized agent id, or was not produced by an explicit
/// peer-level binding, a binding pinning this peer to the intended agent is
/// upserted and the route re-resolved. Once a peer is bound, later requests
/// route to the same agent even if default routing rules would pick another.
pub async fn route_peer(
    resolver: &dyn RouteResolver,
    bindings: &dyn BindingStore,
    channel: &str,
    account_id: &str,
    user_id: &str,
    project_id: &str,
) -> Result<RoutedPeer> {
    let expected = normalize_agent_id(user_id);
    let peer = Peer::user(user_id.trim());

    let mut route = resolver
        .resolve_route(channel, account_id, &peer)
        .await
        .map_err(|e| Error::host("route resolution", e))?;

    if route.agent_id != expected || route.matched != RouteMatch::PeerBinding {
        debug!(
            peer_id = %peer.id,
            resolved = %route.agent_id,
            expected = %expected,
            "pinning peer to agent with an explicit binding"
        );
        bindings
            .upsert(PeerBinding {
                channel: channel.to_string(),
                account_id: account_id.to_string(),
                peer: peer.clone(),
                agent_id: expected.clone(),
            })
            .await
            .map_err(|e| Error::host("binding upsert", e))?;
        route = resolver
            .resolve_route(channel, account_id, &peer)
            .await
            .map_err(|e| Error::host("route re-resolution", e))?;
        info!(peer_id = %peer.id, agent_id = %route.agent_id, "peer bound to agent");
    }

    Ok(RoutedPeer {
        session_key: session_key(&route.agent_id, project_id),
        agent_id: route.agent_id,
        account_id: account_id.to_string(),
    })
}
