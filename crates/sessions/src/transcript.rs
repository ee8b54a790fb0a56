use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use {anyhow::Result, async_trait::async_trait};

/// Source of raw transcript records for a session.
///
/// `Ok(None)` means no session exists for the key; an empty vector means the
/// session exists but holds no records.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn read(&self, session_key: &str) -> Result<Option<Vec<serde_json::Value>>>;
}

/// Reader over the host's JSONL session files.
///
/// One `<key>.jsonl` file per session under `base_dir`, with `:` mapped to
/// `_` in filenames. Malformed lines are skipped with a warning rather than
/// failing the whole read.
pub struct JsonlTranscripts {
    base_dir: PathBuf,
}

impl JsonlTranscripts {
    #[must_use]
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Sanitize a session key for use as a filename.
    #[must_use]
    pub fn key_to_filename(key: &str) -> String {
        key.replace(':', "_")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.jsonl", Self::key_to_filename(key)))
    }
}

#[async_trait]
impl TranscriptSource for JsonlTranscripts {
    async fn read(&self, session_key: &str) -> Result<Option<Vec<serde_json::Value>>> {
        let path = self.path_for(session_key);

        tokio::task::spawn_blocking(move || -> Result<Option<Vec<serde_json::Value>>> {
            if !path.exists() {
                return Ok(None);
            }
            let file = File::open(&path)?;
            let reader = BufReader::new(file);
            let mut records = Vec::new();
            for line in reader.lines() {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str(trimmed) {
                    Ok(val) => records.push(val),
                    Err(e) => {
                        tracing::warn!("skipping malformed JSONL line: {e}");
                    },
                }
            }
            Ok(Some(records))
        })
        .await?
    }
}
