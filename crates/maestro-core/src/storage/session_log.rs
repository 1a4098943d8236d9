//! Append-only per-agent message log.
//!
//! One JSONL file per agent id, one serialized [`Message`] per line, ordered
//! by write time. The file is the sole source of truth when resuming an
//! agent's conversation. A run owns its log exclusively for its duration;
//! distinct agent ids never share a file.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::ai::types::Message;

/// Handle to the log file for one agent id.
#[derive(Debug, Clone)]
pub struct SessionLog {
    agent_id: String,
    path: PathBuf,
}

impl SessionLog {
    /// Deterministic log path for an agent id under `dir`.
    pub fn open(dir: &Path, agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            path: dir.join(format!("agent-{agent_id}.jsonl")),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all persisted messages, in write order.
    ///
    /// A missing file means a fresh conversation and yields an empty list.
    /// A malformed line (e.g. torn by a crashed process) is skipped with a
    /// warning rather than failing the resume.
    pub async fn load(&self) -> Result<Vec<Message>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let mut messages = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    tracing::warn!(
                        agent_id = %self.agent_id,
                        line = line_no + 1,
                        error = %e,
                        "Skipping malformed session log line"
                    );
                }
            }
        }

        Ok(messages)
    }

    /// Append one message as a single JSONL record.
    pub async fn append(&self, message: &Message) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut line = serde_json::to_string(message).context("failed to serialize message")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::{Message, Role};

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::open(dir.path(), "nope");
        assert!(log.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::open(dir.path(), "abc");

        let first = Message::user("first");
        let second = Message::assistant("second");
        log.append(&first).await.unwrap();
        log.append(&second).await.unwrap();

        let loaded = log.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, first.id);
        assert_eq!(loaded[0].content, "first");
        assert_eq!(loaded[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::open(dir.path(), "torn");

        log.append(&Message::user("intact")).await.unwrap();
        let mut raw = tokio::fs::read_to_string(log.path()).await.unwrap();
        raw.push_str("{\"half\": tr");
        tokio::fs::write(log.path(), raw).await.unwrap();

        let loaded = log.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "intact");
    }

    #[tokio::test]
    async fn distinct_agent_ids_use_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = SessionLog::open(dir.path(), "a");
        let b = SessionLog::open(dir.path(), "b");
        assert_ne!(a.path(), b.path());
    }
}
