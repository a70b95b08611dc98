/// Face bounding box in normalized frame coordinates (each in `[0, 1]`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormalizedBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// One detection of a face at one instant of the clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceFrameSample {
    pub time_offset_secs: f64,
    pub bounding_box: NormalizedBox,
}

/// One continuous face identity across the clip's timeline.
///
/// Frames are ordered by time offset, as emitted by the annotation service.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceTrack {
    pub track_id: u32,
    pub frames: Vec<FaceFrameSample>,
}

impl FaceTrack {
    pub fn new(track_id: u32, frames: Vec<FaceFrameSample>) -> Self {
        Self { track_id, frames }
    }

    pub fn first_frame(&self) -> Option<&FaceFrameSample> {
        self.frames.first()
    }

    pub fn last_frame(&self) -> Option<&FaceFrameSample> {
        self.frames.last()
    }
}
