/// Literal directory segment inserted before the filename of every output.
pub const BLURRED_SEGMENT: &str = "blurred";

/// Suffix appended to the file stem of every output.
pub const BLURRED_SUFFIX: &str = "_blurred";

pub const DEFAULT_EXTENSION: &str = "mp4";

/// Seconds a blur window opens before the first detection of a track.
pub const LEAD_PADDING_SECS: f64 = 0.5;

/// Seconds a blur window stays open after the last detection of a track.
pub const TRAIL_PADDING_SECS: f64 = 1.0;

/// Last-detection time assumed for a track without any timed detection.
/// Trailing padding still applies; the compositor clamps the result against
/// the real video duration.
pub const END_OF_CLIP_SECS: f64 = 9999.0;

/// V4 signed URLs cannot outlive seven days.
pub const MAX_SIGNED_URL_TTL_DAYS: u32 = 7;
pub const DEFAULT_SIGNED_URL_TTL_DAYS: u32 = 7;

pub const DEFAULT_ANNOTATION_POLL_SECS: u64 = 5;
