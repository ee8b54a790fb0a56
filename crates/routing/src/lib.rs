//! Peer identity normalization, session-key derivation, and the
//! session-router / agent-provisioner pair that binds an external
//! `(userId, projectId)` pair to a durable conversation.

pub mod normalize;
pub mod provision;
pub mod router;

pub use {
    normalize::{collides, normalize_agent_id},
    provision::{default_workspace, ensure_agent},
    router::{RoutedPeer, route_peer, session_key},
};
