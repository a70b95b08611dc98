use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::shared::region::BlurRegion;

#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("blur processor request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("blur processor failed: {body}")]
    Rejected { status: u16, body: String },
}

impl CompositorError {
    /// Server-side and transport failures are worth retrying; client
    /// errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompositorError::Transport(_) => true,
            CompositorError::Rejected { status, .. } => *status >= 500,
        }
    }
}

/// Everything the external processor needs to redact one clip.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionJob {
    pub source_path: String,
    pub output_path: String,
    pub bucket: String,
    pub faces: Vec<BlurRegion>,
}

/// Domain interface for the pixel-level redaction processor.
///
/// Returning `Ok` means the redacted object exists at `job.output_path`.
#[async_trait]
pub trait RedactionCompositor: Send + Sync {
    async fn redact(&self, job: &RedactionJob) -> Result<(), CompositorError>;
}
