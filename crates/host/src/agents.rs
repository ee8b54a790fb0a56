use {anyhow::Result, async_trait::async_trait};

/// The host gateway's agent registry.
///
/// `list_agent_ids` returns the current snapshot; after `create_agent` the
/// caller must `reload` so subsequent lookups observe the new agent.
#[async_trait]
pub trait AgentRegistry: Send + Sync {
    async fn list_agent_ids(&self) -> Result<Vec<String>>;

    /// Create an agent with the given id and default workspace path.
    async fn create_agent(&self, agent_id: &str, workspace: &str) -> Result<()>;

    /// Force a reload of the host's configuration snapshot.
    async fn reload(&self) -> Result<()>;
}
