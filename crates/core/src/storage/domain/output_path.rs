use crate::shared::constants::{BLURRED_SEGMENT, BLURRED_SUFFIX, DEFAULT_EXTENSION};

const DEFAULT_FILENAME: &str = "video.mp4";

/// Output location for the redacted copy of `source_path`.
///
/// `videos/loc1/raw.mp4` becomes `videos/loc1/blurred/raw_blurred.mp4`.
/// The mapping is pure, so reprocessing the same source overwrites the
/// previous output instead of creating a new object.
pub fn derive_output_path(source_path: &str) -> String {
    let (dir, filename) = match source_path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, source_path),
    };
    let filename = if filename.is_empty() {
        DEFAULT_FILENAME
    } else {
        filename
    };

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, ext),
        _ => (filename, DEFAULT_EXTENSION),
    };

    let output_name = format!("{stem}{BLURRED_SUFFIX}.{ext}");
    match dir {
        Some(dir) => format!("{dir}/{BLURRED_SEGMENT}/{output_name}"),
        None => format!("{BLURRED_SEGMENT}/{output_name}"),
    }
}
