use std::process::Stdio;

use {
    anyhow::{Context, Result, bail},
    async_trait::async_trait,
    tokio::{io::AsyncWriteExt, process::Command},
    tracing::debug,
};

/// Capability that drives one agent turn and returns the reply text.
///
/// Two implementations exist: the host gateway's in-process runner (passed
/// in by the host) and [`CliTurnRunner`], which spawns an external agent
/// process per turn. The dispatcher is agnostic to which one it holds;
/// timeouts are enforced by the caller.
#[async_trait]
pub trait TurnRunner: Send + Sync {
    async fn run_turn(&self, agent_id: &str, session_key: &str, message: &str) -> Result<String>;
}

/// Turn runner that spawns a configured command-line agent.
///
/// The message is written to the child's stdin; the reply is trimmed stdout.
/// Agent and session identity are passed via `ATYPICA_AGENT_ID` and
/// `ATYPICA_SESSION_KEY` environment variables.
pub struct CliTurnRunner {
    command: Vec<String>,
}

impl CliTurnRunner {
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            bail!("cli turn runner requires a non-empty command");
        }
        Ok(Self { command })
    }
}

#[async_trait]
impl TurnRunner for CliTurnRunner {
    async fn run_turn(&self, agent_id: &str, session_key: &str, message: &str) -> Result<String> {
        debug!(agent_id, session_key, program = %self.command[0], "spawning cli agent turn");

        let mut child = Command::new(&self.command[0])
            .args(&self.command[1..])
            .env("ATYPICA_AGENT_ID", agent_id)
            .env("ATYPICA_SESSION_KEY", session_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", self.command[0]))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.as_bytes())
                .await
                .context("write message to agent stdin")?;
            // Closing stdin signals end-of-input to the agent.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .context("wait for agent process")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "agent process exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
