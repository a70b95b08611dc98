//! Google Cloud Storage V4 signed URL construction.
//!
//! Only the string assembly lives here; producing the RSA signature over
//! [`PreparedSignature::string_to_sign`] is the caller's job (the GCS blob
//! store delegates it to the IAM `signBlob` API).

use chrono::{DateTime, Utc};
use percent_encoding::utf8_percent_encode;
use sha2::{Digest, Sha256};

use crate::storage::domain::uri_resolver::{COMPONENT, PATH};

pub const ALGORITHM: &str = "GOOG4-RSA-SHA256";
pub const DEFAULT_DOWNLOAD_HOST: &str = "storage.googleapis.com";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub struct SigningParams<'a> {
    pub host: &'a str,
    pub bucket: &'a str,
    pub path: &'a str,
    pub signer_email: &'a str,
    pub expires_in_days: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSignature {
    host: String,
    resource: String,
    canonical_query: String,
    canonical_request: String,
    string_to_sign: String,
}

impl PreparedSignature {
    pub fn canonical_request(&self) -> &str {
        &self.canonical_request
    }

    pub fn string_to_sign(&self) -> &str {
        &self.string_to_sign
    }

    /// Final download URL carrying the hex-encoded RSA signature.
    pub fn into_url(self, signature: &[u8]) -> String {
        format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            self.host,
            self.resource,
            self.canonical_query,
            hex::encode(signature)
        )
    }
}

pub fn prepare(params: &SigningParams<'_>) -> PreparedSignature {
    let datetime = params.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.timestamp.format("%Y%m%d").to_string();
    let scope = format!("{date}/auto/storage/goog4_request");
    let credential = format!("{}/{scope}", params.signer_email);
    let expires = u64::from(params.expires_in_days) * SECONDS_PER_DAY;

    let resource = format!(
        "/{}/{}",
        params.bucket,
        utf8_percent_encode(params.path, PATH)
    );

    // Already in the lexical order the canonical query requires.
    let query = [
        ("X-Goog-Algorithm", ALGORITHM.to_string()),
        ("X-Goog-Credential", credential),
        ("X-Goog-Date", datetime.clone()),
        ("X-Goog-Expires", expires.to_string()),
        ("X-Goog-SignedHeaders", "host".to_string()),
    ];
    let canonical_query = query
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, COMPONENT)))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_headers = format!("host:{}\n", params.host);
    let canonical_request = [
        "GET",
        resource.as_str(),
        canonical_query.as_str(),
        canonical_headers.as_str(),
        "host",
        "UNSIGNED-PAYLOAD",
    ]
    .join("\n");

    let request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    let string_to_sign = [
        ALGORITHM,
        datetime.as_str(),
        scope.as_str(),
        request_hash.as_str(),
    ]
    .join("\n");

    PreparedSignature {
        host: params.host.to_string(),
        resource,
        canonical_query,
        canonical_request,
        string_to_sign,
    }
}
