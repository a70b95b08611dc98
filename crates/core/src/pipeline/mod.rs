pub mod blur_error;
pub mod blur_video_use_case;
