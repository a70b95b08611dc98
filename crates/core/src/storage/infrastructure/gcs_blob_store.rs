use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};

use crate::auth::access_token::AccessTokenProvider;
use crate::shared::constants::MAX_SIGNED_URL_TTL_DAYS;
use crate::storage::domain::blob_store::{BlobStore, StorageError};
use crate::storage::domain::uri_resolver::COMPONENT;

use super::url_signer::{self, SigningParams, DEFAULT_DOWNLOAD_HOST};

pub const DEFAULT_STORAGE_API: &str = "https://storage.googleapis.com";
pub const DEFAULT_IAM_API: &str = "https://iamcredentials.googleapis.com";

/// Upper bound on `rewriteTo` round trips for one copy.
const MAX_REWRITE_CALLS: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteResponse {
    done: bool,
    #[serde(default)]
    rewrite_token: Option<String>,
    #[serde(default)]
    total_bytes_rewritten: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignBlobRequest {
    payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignBlobResponse {
    signed_blob: String,
}

/// [`BlobStore`] backed by the Google Cloud Storage JSON API.
///
/// Copies use `rewriteTo`, looping on the rewrite token for objects too
/// large to copy in one call. Download links are V4 signed URLs whose
/// signature comes from the IAM `signBlob` endpoint, so no private key
/// material ever lives in this process.
pub struct GcsBlobStore {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    signer_email: String,
    storage_api: String,
    iam_api: String,
    download_host: String,
}

impl GcsBlobStore {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn AccessTokenProvider>,
        signer_email: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            signer_email: signer_email.into(),
            storage_api: DEFAULT_STORAGE_API.to_string(),
            iam_api: DEFAULT_IAM_API.to_string(),
            download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
        }
    }

    pub fn with_storage_api(mut self, url: impl Into<String>) -> Self {
        self.storage_api = url.into();
        self
    }

    pub fn with_iam_api(mut self, url: impl Into<String>) -> Self {
        self.iam_api = url.into();
        self
    }

    fn rewrite_url(&self, bucket: &str, source_path: &str, destination_path: &str) -> String {
        format!(
            "{}/storage/v1/b/{bucket}/o/{}/rewriteTo/b/{bucket}/o/{}",
            self.storage_api.trim_end_matches('/'),
            utf8_percent_encode(source_path, COMPONENT),
            utf8_percent_encode(destination_path, COMPONENT)
        )
    }

    fn sign_blob_url(&self) -> String {
        format!(
            "{}/v1/projects/-/serviceAccounts/{}:signBlob",
            self.iam_api.trim_end_matches('/'),
            self.signer_email
        )
    }

    async fn sign_blob(&self, path: &str, payload: &str) -> Result<Vec<u8>, StorageError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(self.sign_blob_url())
            .bearer_auth(token)
            .json(&SignBlobRequest {
                payload: BASE64.encode(payload.as_bytes()),
            })
            .send()
            .await
            .map_err(StorageError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Sign {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let signed: SignBlobResponse = response.json().await.map_err(StorageError::Transport)?;
        BASE64
            .decode(signed.signed_blob)
            .map_err(|e| StorageError::Malformed(format!("signBlob returned invalid base64: {e}")))
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn copy(
        &self,
        bucket: &str,
        source_path: &str,
        destination_path: &str,
    ) -> Result<(), StorageError> {
        let url = self.rewrite_url(bucket, source_path, destination_path);
        let mut rewrite_token: Option<String> = None;

        for _ in 0..MAX_REWRITE_CALLS {
            let token = self.tokens.access_token().await?;
            let mut request = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&serde_json::json!({}));
            if let Some(ref rt) = rewrite_token {
                request = request.query(&[("rewriteToken", rt)]);
            }

            let response = request.send().await.map_err(StorageError::Transport)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StorageError::Copy {
                    source_path: source_path.to_string(),
                    destination_path: destination_path.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let progress: RewriteResponse =
                response.json().await.map_err(StorageError::Transport)?;
            if progress.done {
                log::debug!(
                    "Copied gs://{bucket}/{source_path} -> {destination_path} ({} bytes)",
                    progress.total_bytes_rewritten.as_deref().unwrap_or("?")
                );
                return Ok(());
            }
            rewrite_token = Some(progress.rewrite_token.ok_or_else(|| {
                StorageError::Malformed("unfinished rewrite without rewriteToken".to_string())
            })?);
        }

        Err(StorageError::Malformed(format!(
            "rewrite of {source_path} did not finish after {MAX_REWRITE_CALLS} calls"
        )))
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_days: u32,
    ) -> Result<String, StorageError> {
        let prepared = url_signer::prepare(&SigningParams {
            host: &self.download_host,
            bucket,
            path,
            signer_email: &self.signer_email,
            expires_in_days: ttl_days.clamp(1, MAX_SIGNED_URL_TTL_DAYS),
            timestamp: Utc::now(),
        });
        let signature = self.sign_blob(path, prepared.string_to_sign()).await?;
        Ok(prepared.into_url(&signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::access_token::StaticTokenProvider;
    use crate::shared::http_stub::StubServer;

    fn store() -> GcsBlobStore {
        GcsBlobStore::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenProvider::new("token")),
            "blur@proj.iam.gserviceaccount.com",
        )
    }

    #[test]
    fn test_rewrite_url_escapes_object_names() {
        let url = store().rewrite_url(
            "b1",
            "videos/loc1/raw.mp4",
            "videos/loc1/blurred/raw_blurred.mp4",
        );
        assert_eq!(
            url,
            "https://storage.googleapis.com/storage/v1/b/b1/o/videos%2Floc1%2Fraw.mp4\
             /rewriteTo/b/b1/o/videos%2Floc1%2Fblurred%2Fraw_blurred.mp4"
        );
    }

    #[test]
    fn test_rewrite_url_uses_overridden_api() {
        let url = store()
            .with_storage_api("http://localhost:4443/")
            .rewrite_url("b1", "a.mp4", "blurred/a_blurred.mp4");
        assert!(url.starts_with("http://localhost:4443/storage/v1/b/b1/o/a.mp4/rewriteTo/"));
    }

    #[test]
    fn test_sign_blob_url() {
        assert_eq!(
            store().sign_blob_url(),
            "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/\
             blur@proj.iam.gserviceaccount.com:signBlob"
        );
    }

    #[test]
    fn test_rewrite_response_in_progress() {
        let parsed: RewriteResponse = serde_json::from_str(
            r#"{"kind":"storage#rewriteResponse","totalBytesRewritten":"1048576",
                "objectSize":"10485760","done":false,"rewriteToken":"tok"}"#,
        )
        .unwrap();
        assert!(!parsed.done);
        assert_eq!(parsed.rewrite_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_rewrite_response_done() {
        let parsed: RewriteResponse =
            serde_json::from_str(r#"{"done":true,"totalBytesRewritten":"42"}"#).unwrap();
        assert!(parsed.done);
        assert!(parsed.rewrite_token.is_none());
    }

    #[test]
    fn test_sign_blob_request_is_base64() {
        let body = serde_json::to_value(SignBlobRequest {
            payload: BASE64.encode(b"GOOG4-RSA-SHA256\nabc"),
        })
        .unwrap();
        assert_eq!(body["payload"], "R09PRzQtUlNBLVNIQTI1NgphYmM=");
    }

    #[tokio::test]
    async fn test_copy_against_unreachable_api_is_transport_error() {
        let store = store().with_storage_api("http://127.0.0.1:9");
        let result = store.copy("b1", "a.mp4", "blurred/a_blurred.mp4").await;
        assert!(matches!(result, Err(StorageError::Transport(_))));
    }

    // ── Against a local server ───────────────────────────────────────

    const REWRITE_TARGET: &str =
        "/storage/v1/b/b1/o/videos%2Fa.mp4/rewriteTo/b/b1/o/videos%2Fblurred%2Fa_blurred.mp4";

    #[tokio::test]
    async fn test_copy_follows_rewrite_token_until_done() {
        let server = StubServer::start(vec![
            (200, r#"{"done": false, "rewriteToken": "tok-1"}"#),
            (200, r#"{"done": false, "rewriteToken": "tok-2"}"#),
            (200, r#"{"done": true, "totalBytesRewritten": "30"}"#),
        ])
        .await;
        let store = store().with_storage_api(server.base_url());

        store
            .copy("b1", "videos/a.mp4", "videos/blurred/a_blurred.mp4")
            .await
            .unwrap();

        let targets: Vec<_> = server.requests().into_iter().map(|r| r.target).collect();
        assert_eq!(
            targets,
            vec![
                REWRITE_TARGET.to_string(),
                format!("{REWRITE_TARGET}?rewriteToken=tok-1"),
                format!("{REWRITE_TARGET}?rewriteToken=tok-2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_copy_rejection_is_copy_error() {
        let server = StubServer::start(vec![(404, "No such object: b1/videos/a.mp4")]).await;
        let store = store().with_storage_api(server.base_url());

        let result = store
            .copy("b1", "videos/a.mp4", "videos/blurred/a_blurred.mp4")
            .await;

        match result {
            Err(StorageError::Copy {
                source_path,
                destination_path,
                status,
                body,
            }) => {
                assert_eq!(source_path, "videos/a.mp4");
                assert_eq!(destination_path, "videos/blurred/a_blurred.mp4");
                assert_eq!(status, 404);
                assert_eq!(body, "No such object: b1/videos/a.mp4");
            }
            other => panic!("expected copy error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unfinished_rewrite_without_token_is_malformed() {
        let server = StubServer::start(vec![(200, r#"{"done": false}"#)]).await;
        let store = store().with_storage_api(server.base_url());

        let result = store.copy("b1", "a.mp4", "blurred/a_blurred.mp4").await;

        assert!(matches!(result, Err(StorageError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_signed_url_hex_encodes_signed_blob() {
        // "AQKr" is base64 for the bytes 01 02 ab.
        let server =
            StubServer::start(vec![(200, r#"{"keyId": "k", "signedBlob": "AQKr"}"#)]).await;
        let store = store().with_iam_api(server.base_url());

        let url = store
            .signed_url("b1", "videos/blurred/a_blurred.mp4", 7)
            .await
            .unwrap();

        assert!(url
            .starts_with("https://storage.googleapis.com/b1/videos/blurred/a_blurred.mp4?"));
        assert!(url.ends_with("&X-Goog-Signature=0102ab"));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].target,
            "/v1/projects/-/serviceAccounts/blur@proj.iam.gserviceaccount.com:signBlob"
        );
        let payload = requests[0].json()["payload"].as_str().unwrap().to_string();
        let string_to_sign = String::from_utf8(BASE64.decode(payload).unwrap()).unwrap();
        assert!(string_to_sign.starts_with("GOOG4-RSA-SHA256\n"));
    }

    #[tokio::test]
    async fn test_sign_rejection_is_sign_error() {
        let server = StubServer::start(vec![(403, "iam.serviceAccounts.signBlob denied")]).await;
        let store = store().with_iam_api(server.base_url());

        let result = store.signed_url("b1", "a.mp4", 7).await;

        assert!(matches!(
            result,
            Err(StorageError::Sign { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_signed_blob_is_malformed() {
        let server = StubServer::start(vec![(200, r#"{"signedBlob": "not base64!"}"#)]).await;
        let store = store().with_iam_api(server.base_url());

        let result = store.signed_url("b1", "a.mp4", 7).await;

        assert!(matches!(result, Err(StorageError::Malformed(_))));
    }
}
