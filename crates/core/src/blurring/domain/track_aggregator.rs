use crate::shared::constants::{END_OF_CLIP_SECS, LEAD_PADDING_SECS, TRAIL_PADDING_SECS};
use crate::shared::face_track::FaceTrack;
use crate::shared::region::BlurRegion;

/// Collapses one face track into a single static [`BlurRegion`].
///
/// The compositor accepts one rectangle per face per clip, so the box is the
/// unweighted mean of every frame's edges. The time window opens
/// [`LEAD_PADDING_SECS`] before the first detection (never below zero) and
/// closes [`TRAIL_PADDING_SECS`] after the last one, with no upper clamp.
///
/// A track without frames still yields a region: zero-sized, starting at 0
/// and closing [`TRAIL_PADDING_SECS`] after [`END_OF_CLIP_SECS`].
pub fn aggregate(track: &FaceTrack) -> BlurRegion {
    let (Some(first), Some(last)) = (track.first_frame(), track.last_frame()) else {
        return BlurRegion {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            start_time: 0.0,
            end_time: END_OF_CLIP_SECS + TRAIL_PADDING_SECS,
        };
    };

    let n = track.frames.len() as f64;
    let (left, top, right, bottom) = track.frames.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(l, t, r, b), frame| {
            let bb = &frame.bounding_box;
            (l + bb.left, t + bb.top, r + bb.right, b + bb.bottom)
        },
    );
    let (left, top, right, bottom) = (left / n, top / n, right / n, bottom / n);

    let start_time = (first.time_offset_secs - LEAD_PADDING_SECS).max(0.0);
    let end_time = (last.time_offset_secs + TRAIL_PADDING_SECS).max(start_time);

    BlurRegion {
        x: left,
        y: top,
        width: (right - left).max(0.0),
        height: (bottom - top).max(0.0),
        start_time,
        end_time,
    }
}

/// Aggregates every track, preserving track order.
pub fn aggregate_all(tracks: &[FaceTrack]) -> Vec<BlurRegion> {
    tracks
        .iter()
        .map(|track| {
            let region = aggregate(track);
            log::debug!(
                "Face {} ({} frames): x={:.3} y={:.3} w={:.3} h={:.3} t={:.1}..{:.1}",
                track.track_id,
                track.frames.len(),
                region.x,
                region.y,
                region.width,
                region.height,
                region.start_time,
                region.end_time
            );
            region
        })
        .collect()
}
