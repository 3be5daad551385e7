//! Attachment byte storage. The workflow only ever handles the relative
//! path this layer hands back; the path is what gets encrypted at rest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
pub trait AttachmentStore: Send + Sync + 'static {
    /// Persists `bytes` under `directory` and returns the relative path
    /// (e.g. `permit_letters/1718700000123_surat.pdf`). The final placement
    /// must be atomic so a concurrent reader never sees a partial file.
    async fn store(&self, directory: &str, suggested_name: &str, bytes: Vec<u8>) -> Result<String>;

    async fn exists(&self, relative_path: &str) -> bool;

    async fn remove(&self, relative_path: &str) -> Result<()>;
}

pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }
}

#[async_trait]
impl AttachmentStore for DiskStorage {
    async fn store(&self, directory: &str, suggested_name: &str, bytes: Vec<u8>) -> Result<String> {
        let filename = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(suggested_name)
        );
        let relative = format!("{directory}/{filename}");

        let dest_dir = self.root.join(directory);
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .with_context(|| format!("failed to create upload directory {}", dest_dir.display()))?;

        // Write to a staging name in the destination directory, then rename
        // into place; rename within a directory is atomic.
        let staging = dest_dir.join(format!(".tmp-{}", Uuid::new_v4()));
        tokio::fs::write(&staging, bytes)
            .await
            .with_context(|| format!("failed to write attachment {}", staging.display()))?;
        tokio::fs::rename(&staging, dest_dir.join(&filename))
            .await
            .with_context(|| format!("failed to move attachment into {}", dest_dir.display()))?;

        Ok(relative)
    }

    async fn exists(&self, relative_path: &str) -> bool {
        tokio::fs::try_exists(self.absolute(relative_path))
            .await
            .unwrap_or(false)
    }

    async fn remove(&self, relative_path: &str) -> Result<()> {
        let full = self.absolute(relative_path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            // the pointer and the physical file are not transactionally
            // linked; a file already gone is not an error
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove attachment {}", full.display()))
            }
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|part| part.to_str())
        .unwrap_or("attachment");

    base.chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => ch,
            _ => '_',
        })
        .collect()
}
