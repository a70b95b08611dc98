use thiserror::Error;

use crate::blurring::domain::redaction_compositor::CompositorError;
use crate::detection::domain::face_annotator::AnnotationError;
use crate::storage::domain::blob_store::StorageError;
use crate::storage::domain::uri_resolver::UriResolutionError;

/// Any reason a pipeline invocation can end in failure.
#[derive(Error, Debug)]
pub enum BlurError {
    #[error(transparent)]
    UriResolution(#[from] UriResolutionError),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Compositor(#[from] CompositorError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl BlurError {
    /// Whether running the same invocation again (with backoff) may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BlurError::UriResolution(_) => false,
            BlurError::Annotation(_) => true,
            BlurError::Compositor(e) => e.is_retryable(),
            BlurError::Storage(_) | BlurError::Internal(_) => false,
        }
    }
}
