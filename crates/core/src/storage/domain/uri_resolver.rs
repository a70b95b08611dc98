use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use thiserror::Error;

use crate::shared::object_ref::ObjectRef;

/// Characters left unescaped in a single path component (RFC 3986 unreserved).
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Like [`COMPONENT`] but keeps `/` so multi-segment paths stay readable.
pub(crate) const PATH: &AsciiSet = &COMPONENT.remove(b'/');

const TOKEN_SIGNED_HOST: &str = "firebasestorage.googleapis.com";
const PUBLIC_HOST: &str = "storage.googleapis.com";
const BUCKET_SUBDOMAIN_SUFFIX: &str = ".firebasestorage.app";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not resolve URI: {url}")]
pub struct UriResolutionError {
    pub url: String,
}

/// One recognized storage URL shape.
///
/// Shapes are independent of each other: supporting a new kind of storage
/// URL means adding one implementation to the resolver's list.
pub trait UrlShape: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` when the URL is not of this shape.
    fn parse(&self, url: &Url) -> Option<ObjectRef>;

    /// Builds a URL of this shape pointing at `object`.
    fn render(&self, object: &ObjectRef) -> String;
}

/// `https://firebasestorage.googleapis.com/v0/b/{bucket}/o/{encoded path}?alt=media&token=…`
pub struct TokenSignedPathStyle;

impl UrlShape for TokenSignedPathStyle {
    fn name(&self) -> &'static str {
        "token-signed"
    }

    fn parse(&self, url: &Url) -> Option<ObjectRef> {
        if url.host_str()? != TOKEN_SIGNED_HOST {
            return None;
        }
        let rest = url.path().strip_prefix("/v0/b/")?;
        let (bucket, encoded) = rest.split_once("/o/")?;
        object_ref(bucket, encoded)
    }

    fn render(&self, object: &ObjectRef) -> String {
        format!(
            "https://{TOKEN_SIGNED_HOST}/v0/b/{}/o/{}?alt=media",
            object.bucket(),
            utf8_percent_encode(object.path(), COMPONENT)
        )
    }
}

/// `https://storage.googleapis.com/{bucket}/{path}`
pub struct PublicHost;

impl UrlShape for PublicHost {
    fn name(&self) -> &'static str {
        "public-host"
    }

    fn parse(&self, url: &Url) -> Option<ObjectRef> {
        if url.host_str()? != PUBLIC_HOST {
            return None;
        }
        let rest = url.path().strip_prefix('/')?;
        let (bucket, encoded) = rest.split_once('/')?;
        object_ref(bucket, encoded)
    }

    fn render(&self, object: &ObjectRef) -> String {
        format!(
            "https://{PUBLIC_HOST}/{}/{}",
            object.bucket(),
            utf8_percent_encode(object.path(), PATH)
        )
    }
}

/// `https://{name}.firebasestorage.app/o/{encoded path}`, where the whole
/// host is the bucket name.
pub struct BucketSubdomain;

impl UrlShape for BucketSubdomain {
    fn name(&self) -> &'static str {
        "bucket-subdomain"
    }

    fn parse(&self, url: &Url) -> Option<ObjectRef> {
        let host = url.host_str()?;
        let label = host.strip_suffix(BUCKET_SUBDOMAIN_SUFFIX)?;
        if label.is_empty() || label.contains('.') {
            return None;
        }
        let encoded = url.path().strip_prefix("/o/")?;
        object_ref(host, encoded)
    }

    fn render(&self, object: &ObjectRef) -> String {
        format!(
            "https://{}/o/{}?alt=media",
            object.bucket(),
            utf8_percent_encode(object.path(), COMPONENT)
        )
    }
}

/// Already-canonical `gs://{bucket}/{path}` references.
pub struct GsUri;

impl UrlShape for GsUri {
    fn name(&self) -> &'static str {
        "gs"
    }

    fn parse(&self, url: &Url) -> Option<ObjectRef> {
        if url.scheme() != "gs" {
            return None;
        }
        let bucket = url.host_str()?;
        let encoded = url.path().strip_prefix('/')?;
        object_ref(bucket, encoded)
    }

    fn render(&self, object: &ObjectRef) -> String {
        object.gs_uri()
    }
}

fn object_ref(bucket: &str, encoded_path: &str) -> Option<ObjectRef> {
    if bucket.is_empty() || bucket.contains('/') {
        return None;
    }
    let path = percent_decode_str(encoded_path).decode_utf8().ok()?;
    if path.is_empty() {
        return None;
    }
    Some(ObjectRef::new(bucket, path.into_owned()))
}

/// Normalizes storage URLs into [`ObjectRef`]s by trying each known
/// [`UrlShape`] in order. The first shape that matches wins.
pub struct UriResolver {
    shapes: Vec<Box<dyn UrlShape>>,
}

impl UriResolver {
    pub fn new(shapes: Vec<Box<dyn UrlShape>>) -> Self {
        Self { shapes }
    }

    pub fn with_shape(mut self, shape: Box<dyn UrlShape>) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn shapes(&self) -> impl Iterator<Item = &dyn UrlShape> {
        self.shapes.iter().map(|s| s.as_ref())
    }

    /// Returns `None` when the input is not a URL or matches no known shape.
    pub fn resolve(&self, url: &str) -> Option<ObjectRef> {
        let parsed = Url::parse(url.trim()).ok()?;
        self.shapes.iter().find_map(|shape| {
            let object = shape.parse(&parsed)?;
            log::debug!("Resolved {url} as {} URL: {object}", shape.name());
            Some(object)
        })
    }

    pub fn try_resolve(&self, url: &str) -> Result<ObjectRef, UriResolutionError> {
        self.resolve(url).ok_or_else(|| UriResolutionError {
            url: url.to_string(),
        })
    }
}

impl Default for UriResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(TokenSignedPathStyle),
            Box::new(PublicHost),
            Box::new(BucketSubdomain),
            Box::new(GsUri),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolver() -> UriResolver {
        UriResolver::default()
    }

    // ── Known shapes ─────────────────────────────────────────────────

    #[test]
    fn test_token_signed_url() {
        let url = "https://firebasestorage.googleapis.com/v0/b/my-app.appspot.com/o/videos%2Floc1%2Fraw.mp4?alt=media&token=abc-123";
        let obj = resolver().resolve(url).unwrap();
        assert_eq!(obj.bucket(), "my-app.appspot.com");
        assert_eq!(obj.path(), "videos/loc1/raw.mp4");
    }

    #[test]
    fn test_public_host_url_strips_query() {
        let url = "https://storage.googleapis.com/b1/videos/loc1/raw.mp4?X-Goog-Signature=ff";
        let obj = resolver().resolve(url).unwrap();
        assert_eq!(obj.bucket(), "b1");
        assert_eq!(obj.path(), "videos/loc1/raw.mp4");
    }

    #[test]
    fn test_bucket_subdomain_url() {
        let url = "https://my-project.firebasestorage.app/o/videos%2Fclip%201.mov?alt=media";
        let obj = resolver().resolve(url).unwrap();
        assert_eq!(obj.bucket(), "my-project.firebasestorage.app");
        assert_eq!(obj.path(), "videos/clip 1.mov");
    }

    #[test]
    fn test_gs_uri() {
        let obj = resolver().resolve("gs://b1/videos/loc1/raw.mp4").unwrap();
        assert_eq!(obj.bucket(), "b1");
        assert_eq!(obj.path(), "videos/loc1/raw.mp4");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let obj = resolver().resolve("  gs://b1/a.mp4\n").unwrap();
        assert_eq!(obj.path(), "a.mp4");
    }

    // ── Unrecognized input ───────────────────────────────────────────

    #[rstest]
    #[case::empty("")]
    #[case::not_a_url("videos/loc1/raw.mp4")]
    #[case::other_host("https://example.com/b1/raw.mp4")]
    #[case::token_signed_missing_object("https://firebasestorage.googleapis.com/v0/b/b1")]
    #[case::token_signed_empty_path("https://firebasestorage.googleapis.com/v0/b/b1/o/")]
    #[case::public_host_bucket_only("https://storage.googleapis.com/b1")]
    #[case::public_host_empty_path("https://storage.googleapis.com/b1/")]
    #[case::subdomain_nested_label("https://a.b.firebasestorage.app/o/x.mp4")]
    #[case::subdomain_wrong_prefix("https://proj.firebasestorage.app/v0/x.mp4")]
    #[case::invalid_utf8("https://storage.googleapis.com/b1/%FF%FE.mp4")]
    fn test_unrecognized_urls_resolve_to_none(#[case] url: &str) {
        assert!(resolver().resolve(url).is_none());
    }

    #[test]
    fn test_try_resolve_reports_url() {
        let err = resolver().try_resolve("https://example.com/x").unwrap_err();
        assert_eq!(err.url, "https://example.com/x");
        assert!(err.to_string().contains("could not resolve URI"));
    }

    #[test]
    fn test_empty_resolver_matches_nothing() {
        let resolver = UriResolver::new(vec![]);
        assert!(resolver.resolve("gs://b1/a.mp4").is_none());
    }

    #[test]
    fn test_shapes_are_extensible() {
        let resolver = UriResolver::new(vec![]).with_shape(Box::new(GsUri));
        assert!(resolver.resolve("gs://b1/a.mp4").is_some());
        assert_eq!(resolver.shapes().count(), 1);
    }

    #[test]
    fn test_default_shape_order() {
        let names: Vec<_> = resolver().shapes().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["token-signed", "public-host", "bucket-subdomain", "gs"]
        );
    }

    // ── Round trip ───────────────────────────────────────────────────

    #[rstest]
    #[case::token_signed(Box::new(TokenSignedPathStyle) as Box<dyn UrlShape>, "b1")]
    #[case::public_host(Box::new(PublicHost) as Box<dyn UrlShape>, "b1")]
    #[case::bucket_subdomain(Box::new(BucketSubdomain) as Box<dyn UrlShape>, "proj.firebasestorage.app")]
    #[case::gs(Box::new(GsUri) as Box<dyn UrlShape>, "b1")]
    fn test_render_then_resolve_recovers_path(
        #[case] shape: Box<dyn UrlShape>,
        #[case] bucket: &str,
        #[values(
            "videos/loc1/raw.mp4",
            "videos/with space/clip (1).mov",
            "deep/a/b/c/d.webm",
            "unicode/caf\u{e9}.mp4"
        )]
        path: &str,
    ) {
        let original = ObjectRef::new(bucket, path);
        let url = shape.render(&original);

        let resolved = resolver().resolve(&url).unwrap();

        assert_eq!(resolved, original, "round trip through {url}");
    }
}
