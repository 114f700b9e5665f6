use crate::ingest::types::TranscriptFragment;
use anyhow::{ensure, Context};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const LAST_SESSION_FILE: &str = "last_processed_video.txt";

/// Where a fetched transcript lives, handed from the fetch step to the analyze step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPointer {
    pub content_id: String,
    pub transcript_path: PathBuf,
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists `fragments` and records `content_id` as the latest session.
    async fn save_transcript(
        &self,
        content_id: &str,
        fragments: &[TranscriptFragment],
    ) -> anyhow::Result<SessionPointer>;

    async fn last_session(&self) -> anyhow::Result<SessionPointer>;

    fn pointer_for(&self, content_id: &str) -> anyhow::Result<SessionPointer>;

    async fn load_fragments(&self, pointer: &SessionPointer)
        -> anyhow::Result<Vec<TranscriptFragment>>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn last_session_path(&self) -> PathBuf {
        self.dir.join(LAST_SESSION_FILE)
    }
}

fn validate_content_id(content_id: &str) -> anyhow::Result<()> {
    ensure!(!content_id.trim().is_empty(), "content id must be non-empty");
    ensure!(
        !content_id.contains(&['/', '\\'][..]) && content_id != "." && content_id != "..",
        "content id must not contain path separators: {content_id}"
    );
    Ok(())
}

/// JSON array with 4-space indentation, non-ASCII kept as-is.
fn to_pretty_json(fragments: &[TranscriptFragment]) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    fragments
        .serialize(&mut ser)
        .context("failed to serialize transcript fragments")?;
    Ok(buf)
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn save_transcript(
        &self,
        content_id: &str,
        fragments: &[TranscriptFragment],
    ) -> anyhow::Result<SessionPointer> {
        let pointer = self.pointer_for(content_id)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create data dir {}", self.dir.display()))?;

        let body = to_pretty_json(fragments)?;
        tokio::fs::write(&pointer.transcript_path, body)
            .await
            .with_context(|| {
                format!("failed to write {}", pointer.transcript_path.display())
            })?;

        let last_path = self.last_session_path();
        tokio::fs::write(&last_path, content_id)
            .await
            .with_context(|| format!("failed to write {}", last_path.display()))?;

        tracing::info!(
            %content_id,
            fragments = fragments.len(),
            path = %pointer.transcript_path.display(),
            "saved transcript session"
        );
        Ok(pointer)
    }

    async fn last_session(&self) -> anyhow::Result<SessionPointer> {
        let path = self.last_session_path();
        let content_id = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("session file {} not found", path.display()))?;
        self.pointer_for(content_id.trim())
            .with_context(|| format!("session file {} is invalid", path.display()))
    }

    fn pointer_for(&self, content_id: &str) -> anyhow::Result<SessionPointer> {
        validate_content_id(content_id)?;
        Ok(SessionPointer {
            content_id: content_id.to_string(),
            transcript_path: self.dir.join(format!("{content_id}_transcript_data.json")),
        })
    }

    async fn load_fragments(
        &self,
        pointer: &SessionPointer,
    ) -> anyhow::Result<Vec<TranscriptFragment>> {
        let path = &pointer.transcript_path;
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("transcript file not found at {}", path.display()))?;
        serde_json::from_str::<Vec<TranscriptFragment>>(&text)
            .with_context(|| format!("could not decode JSON from {}", path.display()))
    }
}
