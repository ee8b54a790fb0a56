use {
    anyhow::Result,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

/// Kind of external peer a binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerKind {
    User,
    Group,
}

impl PeerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

/// An external identity as seen by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub kind: PeerKind,
    pub id: String,
}

impl Peer {
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: PeerKind::User,
            id: id.into(),
        }
    }
}

/// A persisted mapping from a peer pattern to an agent id.
///
/// Created lazily the first time a peer needs disambiguation; never deleted
/// by this plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerBinding {
    pub channel: String,
    pub account_id: String,
    pub peer: Peer,
    pub agent_id: String,
}

impl PeerBinding {
    /// Identity key for idempotent upserts.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.channel,
            self.account_id,
            self.peer.kind.as_str(),
            self.peer.id
        )
    }
}

/// Persistent storage for peer bindings, owned by the host.
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Insert or replace a binding. Re-adding an identical key is a no-op.
    async fn upsert(&self, binding: PeerBinding) -> Result<()>;

    async fn list(&self) -> Result<Vec<PeerBinding>>;
}
