use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::blurring::domain::redaction_compositor::{RedactionCompositor, RedactionJob};
use crate::blurring::domain::track_aggregator;
use crate::blurring::infrastructure::http_compositor::HttpCompositor;
use crate::config::{BlurConfig, RedactionMode};
use crate::detection::domain::face_annotator::FaceAnnotator;
use crate::shared::blur_result::BlurResult;
use crate::storage::domain::blob_store::BlobStore;
use crate::storage::domain::output_path::derive_output_path;
use crate::storage::domain::uri_resolver::UriResolver;

use super::blur_error::BlurError;

/// What a successful run produced.
struct Completed {
    blurred_url: String,
    blurred_storage_path: String,
    faces_detected: usize,
}

/// Snapshot of how the pipeline is wired.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineHealth {
    pub redaction_mode: RedactionMode,
    pub url_shapes: Vec<&'static str>,
    pub signed_url_ttl_days: u32,
}

/// Orchestrates face anonymization for one stored video.
///
/// Resolves the video URL, runs face detection, then either copies the
/// source (no faces, or no compositor configured) or hands aggregated blur
/// regions to the compositor. Every collaborator is injected; the use case
/// holds no mutable state, so one instance can serve concurrent calls.
pub struct BlurVideoUseCase {
    resolver: UriResolver,
    annotator: Arc<dyn FaceAnnotator>,
    store: Arc<dyn BlobStore>,
    compositor: Option<Arc<dyn RedactionCompositor>>,
    signed_url_ttl_days: u32,
}

impl BlurVideoUseCase {
    pub fn new(
        resolver: UriResolver,
        annotator: Arc<dyn FaceAnnotator>,
        store: Arc<dyn BlobStore>,
        compositor: Option<Arc<dyn RedactionCompositor>>,
        signed_url_ttl_days: u32,
    ) -> Self {
        Self {
            resolver,
            annotator,
            store,
            compositor,
            signed_url_ttl_days,
        }
    }

    /// Wires an [`HttpCompositor`] when `config` names a processor.
    pub fn from_config(
        config: &BlurConfig,
        client: reqwest::Client,
        annotator: Arc<dyn FaceAnnotator>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        let compositor = config.compositor.as_ref().map(|c| {
            Arc::new(HttpCompositor::new(client.clone(), c)) as Arc<dyn RedactionCompositor>
        });
        Self::new(
            UriResolver::default(),
            annotator,
            store,
            compositor,
            config.signed_url_ttl_days,
        )
    }

    pub fn redaction_mode(&self) -> RedactionMode {
        match self.compositor {
            Some(_) => RedactionMode::Compositor,
            None => RedactionMode::DevFallback,
        }
    }

    /// True when clips with faces will be copied without redaction.
    pub fn is_dev_fallback(&self) -> bool {
        self.redaction_mode() == RedactionMode::DevFallback
    }

    pub fn health(&self) -> PipelineHealth {
        PipelineHealth {
            redaction_mode: self.redaction_mode(),
            url_shapes: self.resolver.shapes().map(|s| s.name()).collect(),
            signed_url_ttl_days: self.signed_url_ttl_days,
        }
    }

    /// Runs the whole pipeline for one video.
    ///
    /// Never panics and never returns an error: every failure, including an
    /// unexpected panic inside a collaborator, ends up in the returned
    /// [`BlurResult`].
    pub async fn blur_video(&self, video_url: &str, storage_path: &str) -> BlurResult {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run(video_url, storage_path))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(BlurError::Internal(panic_message(panic.as_ref()))));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(done) => {
                log::info!(
                    "Finished {storage_path} in {elapsed_ms}ms ({} faces)",
                    done.faces_detected
                );
                BlurResult::succeeded(
                    done.blurred_url,
                    done.blurred_storage_path,
                    done.faces_detected,
                    elapsed_ms,
                )
            }
            Err(e) => {
                log::error!(
                    "Blurring {storage_path} failed after {elapsed_ms}ms (retryable: {}): {e}",
                    e.is_retryable()
                );
                BlurResult::failed(e.to_string(), elapsed_ms)
            }
        }
    }

    async fn run(&self, video_url: &str, storage_path: &str) -> Result<Completed, BlurError> {
        let object = self.resolver.try_resolve(video_url)?;
        log::info!("Processing {object}");

        let faces = self.annotator.detect_faces(&object).await?;
        let faces_detected = faces.len();
        let bucket = object.bucket();
        let output_path = derive_output_path(storage_path);

        if faces.is_empty() {
            log::info!("No faces detected, copying original to {output_path}");
            self.store.copy(bucket, storage_path, &output_path).await?;
        } else if let Some(compositor) = &self.compositor {
            let job = RedactionJob {
                source_path: storage_path.to_string(),
                output_path: output_path.clone(),
                bucket: bucket.to_string(),
                faces: track_aggregator::aggregate_all(&faces),
            };
            compositor.redact(&job).await?;
        } else {
            log::warn!(
                "DEV FALLBACK: no blur processor configured; copying {storage_path} with \
                 {faces_detected} face(s) UNREDACTED to {output_path}"
            );
            self.store.copy(bucket, storage_path, &output_path).await?;
        }

        let blurred_url = self
            .store
            .signed_url(bucket, &output_path, self.signed_url_ttl_days)
            .await?;

        Ok(Completed {
            blurred_url,
            blurred_storage_path: output_path,
            faces_detected,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}
