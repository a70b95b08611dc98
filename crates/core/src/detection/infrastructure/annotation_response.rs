//! Wire types for the Video Intelligence `videos:annotate` operation and
//! their conversion into [`FaceTrack`]s.

use serde::{Deserialize, Serialize};

use crate::detection::domain::face_annotator::AnnotationError;
use crate::shared::face_track::{FaceFrameSample, FaceTrack, NormalizedBox};

const NANOS_PER_SEC: f64 = 1e9;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnotateVideoRequest {
    pub input_uri: String,
    pub features: Vec<&'static str>,
    pub video_context: VideoContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoContext {
    pub face_detection_config: FaceDetectionConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FaceDetectionConfig {
    pub include_bounding_boxes: bool,
    pub include_attributes: bool,
}

impl AnnotateVideoRequest {
    /// Face detection with bounding boxes only.
    pub fn face_detection(input_uri: String) -> Self {
        Self {
            input_uri,
            features: vec!["FACE_DETECTION"],
            video_context: VideoContext {
                face_detection_config: FaceDetectionConfig {
                    include_bounding_boxes: true,
                    include_attributes: false,
                },
            },
        }
    }
}

/// A long-running operation as returned by submit and poll calls.
#[derive(Debug, Deserialize)]
pub(crate) struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<Status>,
    #[serde(default)]
    pub response: Option<AnnotateVideoResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnotateVideoResponse {
    #[serde(default)]
    pub annotation_results: Vec<VideoAnnotationResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoAnnotationResults {
    #[serde(default)]
    pub face_detection_annotations: Vec<FaceDetectionAnnotation>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FaceDetectionAnnotation {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Track {
    #[serde(default)]
    pub timestamped_objects: Vec<TimestampedObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimestampedObject {
    #[serde(default)]
    pub normalized_bounding_box: Option<WireBox>,
    #[serde(default)]
    pub time_offset: Option<ProtoDuration>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireBox {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
}

/// `google.protobuf.Duration` in either of its JSON encodings:
/// `"12.345s"` or `{"seconds": "12", "nanos": 345000000}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProtoDuration {
    Text(String),
    Parts {
        #[serde(default)]
        seconds: Option<Int64>,
        #[serde(default)]
        nanos: Option<i64>,
    },
}

/// Protobuf int64 values arrive as JSON strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Int64 {
    Number(i64),
    Text(String),
}

impl Int64 {
    fn value(&self) -> Result<i64, AnnotationError> {
        match self {
            Int64::Number(n) => Ok(*n),
            Int64::Text(s) => s
                .parse()
                .map_err(|_| AnnotationError::Malformed(format!("invalid int64 {s:?}"))),
        }
    }
}

impl ProtoDuration {
    /// Whole seconds plus the sub-second remainder, as one offset.
    pub fn as_secs_f64(&self) -> Result<f64, AnnotationError> {
        match self {
            ProtoDuration::Text(text) => text
                .strip_suffix('s')
                .and_then(|n| n.parse::<f64>().ok())
                .ok_or_else(|| AnnotationError::Malformed(format!("invalid duration {text:?}"))),
            ProtoDuration::Parts { seconds, nanos } => {
                let whole = seconds.as_ref().map(Int64::value).transpose()?.unwrap_or(0);
                let fraction = nanos.unwrap_or(0);
                Ok(whole as f64 + fraction as f64 / NANOS_PER_SEC)
            }
        }
    }
}

impl Operation {
    /// Converts a finished operation into face tracks.
    ///
    /// Every track of every face annotation becomes one [`FaceTrack`],
    /// numbered in response order, with frames sorted by time offset.
    pub fn into_face_tracks(self) -> Result<Vec<FaceTrack>, AnnotationError> {
        if let Some(status) = self.error {
            return Err(job_failed(status));
        }
        let response = self.response.ok_or_else(|| {
            AnnotationError::Malformed(format!(
                "operation {} finished without a response",
                self.name
            ))
        })?;

        let Some(results) = response.annotation_results.into_iter().next() else {
            return Ok(Vec::new());
        };
        if let Some(status) = results.error {
            return Err(job_failed(status));
        }

        let mut tracks = Vec::new();
        for annotation in results.face_detection_annotations {
            for track in annotation.tracks {
                let track_id = tracks.len() as u32;
                tracks.push(FaceTrack::new(track_id, parse_frames(track)?));
            }
        }
        Ok(tracks)
    }
}

fn parse_frames(track: Track) -> Result<Vec<FaceFrameSample>, AnnotationError> {
    let mut frames = track
        .timestamped_objects
        .into_iter()
        .map(|object| -> Result<FaceFrameSample, AnnotationError> {
            let time_offset_secs = match object.time_offset {
                Some(ref duration) => duration.as_secs_f64()?,
                None => 0.0,
            };
            let b = object.normalized_bounding_box.unwrap_or_default();
            Ok(FaceFrameSample {
                time_offset_secs,
                bounding_box: NormalizedBox::new(b.left, b.top, b.right, b.bottom),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    frames.sort_by(|a, b| a.time_offset_secs.total_cmp(&b.time_offset_secs));
    Ok(frames)
}

fn job_failed(status: Status) -> AnnotationError {
    AnnotationError::JobFailed {
        code: status.code,
        message: status.message,
    }
}
