// Upload storage
//
// Raw uploads are handed to an `UploadSink` before parsing. The key it
// returns identifies the dataset in the upload response.

use async_trait::async_trait;

use crate::types::AppResult;

pub mod local;

pub use local::LocalUploadSink;

#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Persist the raw upload and return its location key.
    async fn store(&self, filename: &str, bytes: &[u8]) -> AppResult<String>;
}
