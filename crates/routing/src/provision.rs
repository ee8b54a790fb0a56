//! Idempotent agent provisioning for newly seen identities.

use {
    atypica_common::{Error, Result},
    atypica_host::AgentRegistry,
    tracing::info,
};

/// Deterministic default workspace for an agent, derived from the ORIGINAL
/// (non-normalized) external user id.
#[must_use]
pub fn default_workspace(user_id: &str) -> String {
    format!("atypica-{}", user_id.trim())
}

/// Ensure an agent with `agent_id` exists in the host registry.
///
/// Existence is checked by case-insensitive, trimmed id match against the
/// current snapshot. On miss the agent is created and the registry reloaded
/// so subsequent lookups observe it. Creation failure is fatal to the
/// current request but carries the tool's error text instead of panicking.
pub async fn ensure_agent(
    registry: &dyn AgentRegistry,
    agent_id: &str,
    original_user_id: &str,
) -> Result<()> {
    let snapshot = registry
        .list_agent_ids()
        .await
        .map_err(|e| Error::host("agent registry snapshot", e))?;

    let wanted = agent_id.trim().to_lowercase();
    if snapshot.iter().any(|id| id.trim().to_lowercase() == wanted) {
        return Ok(());
    }

    let workspace = default_workspace(original_user_id);
    info!(agent_id, workspace, "creating agent for newly seen identity");
    registry
        .create_agent(agent_id, &workspace)
        .await
        .map_err(|e| Error::provision(format!("create agent {agent_id}"), e))?;

    registry
        .reload()
        .await
        .map_err(|e| Error::host("registry reload after create", e))?;

    Ok(())
}
