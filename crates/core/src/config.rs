use std::fmt;
use std::time::Duration;

use crate::detection::infrastructure::video_intelligence_client::DEFAULT_VIDEO_INTELLIGENCE_API;
use crate::shared::constants::{
    DEFAULT_ANNOTATION_POLL_SECS, DEFAULT_SIGNED_URL_TTL_DAYS, MAX_SIGNED_URL_TTL_DAYS,
};
use crate::storage::infrastructure::gcs_blob_store::{DEFAULT_IAM_API, DEFAULT_STORAGE_API};

/// Connection details for the external redaction processor.
#[derive(Clone, PartialEq)]
pub struct CompositorConfig {
    pub base_url: String,
    pub api_key: String,
}

impl CompositorConfig {
    /// `None` when no processor URL is set. A blank URL counts as unset.
    pub fn from_parts(base_url: Option<String>, api_key: Option<String>) -> Option<Self> {
        let base_url = base_url.filter(|url| !url.trim().is_empty())?;
        Some(Self {
            base_url: base_url.trim().to_string(),
            api_key: api_key.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for CompositorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorConfig")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// How faces are removed when a clip has any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedactionMode {
    /// Regions are sent to the external compositor.
    Compositor,
    /// No compositor configured: the source is copied unredacted.
    DevFallback,
}

impl fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedactionMode::Compositor => write!(f, "compositor"),
            RedactionMode::DevFallback => write!(f, "dev-fallback (faces are NOT redacted)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlurConfig {
    pub compositor: Option<CompositorConfig>,
    pub signed_url_ttl_days: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            compositor: None,
            signed_url_ttl_days: DEFAULT_SIGNED_URL_TTL_DAYS,
        }
    }
}

impl BlurConfig {
    pub fn with_compositor(mut self, compositor: Option<CompositorConfig>) -> Self {
        self.compositor = compositor;
        self
    }

    /// Clamped to what a V4 signed URL allows.
    pub fn with_signed_url_ttl_days(mut self, days: u32) -> Self {
        self.signed_url_ttl_days = days.clamp(1, MAX_SIGNED_URL_TTL_DAYS);
        self
    }
}

/// Endpoints and identities for the Google Cloud collaborators.
#[derive(Clone, Debug, PartialEq)]
pub struct GoogleConfig {
    /// Service account whose key signs download URLs through IAM.
    pub signer_email: String,
    pub video_intelligence_api: String,
    pub storage_api: String,
    pub iam_api: String,
    pub annotation_poll_interval: Duration,
}

impl GoogleConfig {
    pub fn new(signer_email: impl Into<String>) -> Self {
        Self {
            signer_email: signer_email.into(),
            video_intelligence_api: DEFAULT_VIDEO_INTELLIGENCE_API.to_string(),
            storage_api: DEFAULT_STORAGE_API.to_string(),
            iam_api: DEFAULT_IAM_API.to_string(),
            annotation_poll_interval: Duration::from_secs(DEFAULT_ANNOTATION_POLL_SECS),
        }
    }
}
