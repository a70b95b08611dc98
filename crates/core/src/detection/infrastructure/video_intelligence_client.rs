use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::access_token::AccessTokenProvider;
use crate::detection::domain::face_annotator::{AnnotationError, FaceAnnotator};
use crate::shared::constants::DEFAULT_ANNOTATION_POLL_SECS;
use crate::shared::face_track::FaceTrack;
use crate::shared::object_ref::ObjectRef;

use super::annotation_response::{AnnotateVideoRequest, Operation};

pub const DEFAULT_VIDEO_INTELLIGENCE_API: &str = "https://videointelligence.googleapis.com";

/// [`FaceAnnotator`] backed by the Google Cloud Video Intelligence REST API.
///
/// Submits a `videos:annotate` job and polls the returned long-running
/// operation until it reports `done`. The wait is unbounded: the service
/// offers no progress or cancellation, so callers that need a deadline
/// wrap the whole pipeline call in a timeout.
pub struct VideoIntelligenceClient {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    api_base: String,
    poll_interval: Duration,
}

impl VideoIntelligenceClient {
    pub fn new(client: reqwest::Client, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            tokens,
            api_base: DEFAULT_VIDEO_INTELLIGENCE_API.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_ANNOTATION_POLL_SECS),
        }
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/videos:annotate", self.api_base.trim_end_matches('/'))
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/v1/{name}", self.api_base.trim_end_matches('/'))
    }

    async fn submit(&self, object: &ObjectRef) -> Result<Operation, AnnotationError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(self.annotate_url())
            .bearer_auth(token)
            .json(&AnnotateVideoRequest::face_detection(object.gs_uri()))
            .send()
            .await
            .map_err(AnnotationError::Transport)?;
        read_operation(response).await
    }

    async fn poll(&self, name: &str) -> Result<Operation, AnnotationError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(self.operation_url(name))
            .bearer_auth(token)
            .send()
            .await
            .map_err(AnnotationError::Transport)?;
        read_operation(response).await
    }
}

async fn read_operation(response: reqwest::Response) -> Result<Operation, AnnotationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AnnotationError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    response.json().await.map_err(AnnotationError::Transport)
}

#[async_trait]
impl FaceAnnotator for VideoIntelligenceClient {
    async fn detect_faces(&self, object: &ObjectRef) -> Result<Vec<FaceTrack>, AnnotationError> {
        log::info!("Detecting faces in {object}");
        let mut operation = self.submit(object).await?;
        log::info!("Waiting for face detection job {}", operation.name);

        let mut polls = 0usize;
        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;
            operation = self.poll(&operation.name).await?;
            polls += 1;
        }

        let faces = operation.into_face_tracks()?;
        log::info!("Detected {} faces after {polls} polls", faces.len());
        Ok(faces)
    }
}
