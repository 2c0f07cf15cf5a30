// Local-directory upload sink

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::storage::UploadSink;
use crate::types::{AppError, AppResult};

pub struct LocalUploadSink {
    root: PathBuf,
}

impl LocalUploadSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

/// Final path component only, with anything outside `[A-Za-z0-9._-]` replaced.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl UploadSink for LocalUploadSink {
    async fn store(&self, filename: &str, bytes: &[u8]) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", self.root.display(), e)))?;

        let key = format!("{}_{}", uuid::Uuid::new_v4(), sanitize_filename(filename));
        let path = self.path_for(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(key = %key, size = bytes.len(), "Stored upload");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("sales 2024.csv"), "sales_2024.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(".."), "upload");
    }

    #[tokio::test]
    async fn test_store_writes_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalUploadSink::new(dir.path().join("uploads"));

        let key = sink.store("report.csv", b"a,b\n1,2\n").await.unwrap();
        assert!(key.ends_with("_report.csv"));

        let written = std::fs::read(sink.path_for(&key)).unwrap();
        assert_eq!(written, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_keys_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalUploadSink::new(dir.path());
        let first = sink.store("same.csv", b"x").await.unwrap();
        let second = sink.store("same.csv", b"x").await.unwrap();
        assert_ne!(first, second);
    }
}
