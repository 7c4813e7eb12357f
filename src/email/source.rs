//! Where raw messages come from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::email::sample::sample_email;
use crate::error::SourceError;

/// File name used when seeding an empty directory.
pub const SAMPLE_FILE_NAME: &str = "sample_email.eml";

/// An undecoded message plus an identifier for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

/// A provider of raw messages for one batch run.
#[async_trait]
pub trait MessageSource: Send + Sync {
    fn name(&self) -> &str;

    /// Every message currently available, in a stable order.
    async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError>;
}

/// Reads `*.eml` files from a directory, ordered by file name.
///
/// The directory is created if missing. With seeding enabled, an empty
/// directory receives the built-in sample message first.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    seed_sample: bool,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seed_sample: true,
        }
    }

    pub fn with_seed_sample(mut self, seed: bool) -> Self {
        self.seed_sample = seed;
        self
    }

    async fn eml_paths(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && path.extension().is_some_and(|ext| ext == "eml") {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    async fn is_empty(&self) -> Result<bool, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let first = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        Ok(first.is_none())
    }

    async fn seed(&self) -> Result<(), SourceError> {
        let path = self.dir.join(SAMPLE_FILE_NAME);
        let bytes = sample_email()?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&path, e))?;
        info!(path = %path.display(), "Seeded empty mail directory with sample message");
        Ok(())
    }
}

#[async_trait]
impl MessageSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        if self.seed_sample && self.is_empty().await? {
            self.seed().await?;
        }

        let mut messages = Vec::new();
        for path in self.eml_paths().await? {
            let id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match tokio::fs::read(&path).await {
                Ok(bytes) => messages.push(RawMessage::new(id, bytes)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable message file"),
            }
        }

        debug!(dir = %self.dir.display(), count = messages.len(), "Loaded messages");
        Ok(messages)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}
