use serde::Serialize;

/// Terminal outcome of one pipeline invocation.
///
/// Built exactly once through [`BlurResult::succeeded`] or
/// [`BlurResult::failed`]; there is no partially-filled state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlurResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurred_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurred_storage_path: Option<String>,
    /// Number of face tracks, not distinct people: the detector may report
    /// one person as several tracks, and each one is redacted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces_detected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

impl BlurResult {
    pub fn succeeded(
        blurred_url: String,
        blurred_storage_path: String,
        faces_detected: usize,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            blurred_url: Some(blurred_url),
            blurred_storage_path: Some(blurred_storage_path),
            faces_detected: Some(faces_detected),
            error: None,
            processing_time_ms,
        }
    }

    /// An empty message is replaced so failures always carry some text.
    pub fn failed(error: impl Into<String>, processing_time_ms: u64) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            success: false,
            blurred_url: None,
            blurred_storage_path: None,
            faces_detected: None,
            error: Some(error),
            processing_time_ms,
        }
    }
}
