use async_trait::async_trait;
use thiserror::Error;

use crate::auth::access_token::AuthError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("copy {source_path} -> {destination_path} failed with status {status}: {body}")]
    Copy {
        source_path: String,
        destination_path: String,
        status: u16,
        body: String,
    },
    #[error("signing URL for {path} failed with status {status}: {body}")]
    Sign {
        path: String,
        status: u16,
        body: String,
    },
    #[error("malformed storage response: {0}")]
    Malformed(String),
    #[error("storage authorization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Object storage the pipeline copies within and issues download links for.
///
/// Copies never leave `bucket`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn copy(
        &self,
        bucket: &str,
        source_path: &str,
        destination_path: &str,
    ) -> Result<(), StorageError>;

    /// Time-limited read URL for `path`.
    async fn signed_url(&self, bucket: &str, path: &str, ttl_days: u32)
        -> Result<String, StorageError>;
}
