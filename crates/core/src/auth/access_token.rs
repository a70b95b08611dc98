use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the server-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no access token configured")]
    Missing,
    #[error("token request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("token endpoint returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Supplies OAuth bearer tokens for Google APIs.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// A token handed in by whatever process wires the pipeline.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::Missing);
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Fetches tokens for the default service account from the GCE / Cloud Run
/// metadata server and caches them until shortly before expiry.
pub struct MetadataServerTokenProvider {
    client: reqwest::Client,
    url: String,
    cached: Mutex<Option<(String, Instant)>>,
}

impl MetadataServerTokenProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: METADATA_TOKEN_URL.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn fetch(&self) -> Result<MetadataToken, AuthError> {
        let request_error = |source| AuthError::Request {
            url: self.url.clone(),
            source,
        };
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(request_error)
    }
}

#[async_trait]
impl AccessTokenProvider for MetadataServerTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Instant::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some((fresh.access_token.clone(), Instant::now() + lifetime));
        log::debug!("Refreshed metadata server token (valid {}s)", lifetime.as_secs());
        Ok(fresh.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned() {
        let provider = StaticTokenProvider::new("ya29.token");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");
    }

    #[tokio::test]
    async fn test_blank_static_token_is_missing() {
        let provider = StaticTokenProvider::new("   ");
        assert!(matches!(
            provider.access_token().await,
            Err(AuthError::Missing)
        ));
    }

    #[test]
    fn test_metadata_token_deserializes() {
        let token: MetadataToken = serde_json::from_str(
            r#"{"access_token":"abc","expires_in":3599,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3599);
    }

    #[tokio::test]
    async fn test_metadata_unreachable_is_request_error() {
        let provider = MetadataServerTokenProvider::new(reqwest::Client::new())
            .with_url("http://127.0.0.1:9/token");
        assert!(matches!(
            provider.access_token().await,
            Err(AuthError::Request { .. })
        ));
    }
}
