pub mod annotation_response;
pub mod video_intelligence_client;
