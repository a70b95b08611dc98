use std::fmt;

/// Locator for one stored object.
///
/// Only the URI resolver builds these from outside input, so every
/// `ObjectRef` in the pipeline names a bucket and path that came from a
/// recognized storage URL shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    bucket: String,
    path: String,
}

impl ObjectRef {
    pub(crate) fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical `gs://bucket/path` form accepted by the annotation service.
    pub fn gs_uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.path)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.path)
    }
}
