use async_trait::async_trait;
use thiserror::Error;

use crate::auth::access_token::AuthError;
use crate::shared::face_track::FaceTrack;
use crate::shared::object_ref::ObjectRef;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("annotation authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("annotation request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("annotation service returned status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("face detection job failed (code {code}): {message}")]
    JobFailed { code: i32, message: String },
    #[error("malformed annotation response: {0}")]
    Malformed(String),
}

/// Domain interface for the long-running face detection job.
///
/// `Ok(vec![])` means the job finished and found no faces. Every failure,
/// including authorization and quota errors, comes back as an
/// [`AnnotationError`] so it can never be mistaken for an empty clip.
#[async_trait]
pub trait FaceAnnotator: Send + Sync {
    async fn detect_faces(&self, object: &ObjectRef) -> Result<Vec<FaceTrack>, AnnotationError>;
}
