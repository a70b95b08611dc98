use async_trait::async_trait;

use crate::blurring::domain::redaction_compositor::{
    CompositorError, RedactionCompositor, RedactionJob,
};
use crate::config::CompositorConfig;

/// [`RedactionCompositor`] that POSTs jobs to an external blur processor's
/// `/blur` endpoint with a bearer key.
///
/// A non-2xx response is returned as-is with its body; no retries happen
/// here.
pub struct HttpCompositor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCompositor {
    pub fn new(client: reqwest::Client, config: &CompositorConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/blur", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RedactionCompositor for HttpCompositor {
    async fn redact(&self, job: &RedactionJob) -> Result<(), CompositorError> {
        log::info!(
            "Requesting redaction of {} face(s) from {}: {} -> {}",
            job.faces.len(),
            self.endpoint(),
            job.source_path,
            job.output_path
        );
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(job)
            .send()
            .await
            .map_err(CompositorError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompositorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
