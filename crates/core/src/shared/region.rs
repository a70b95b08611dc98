use serde::Serialize;

/// The single static rectangle and time window redacted for one face track.
///
/// Geometry is normalized to the frame (`[0, 1]`), times are in seconds.
/// Serializes to the compositor wire shape
/// `{x, y, width, height, startTime, endTime}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlurRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub start_time: f64,
    pub end_time: f64,
}
