pub mod blur_result;
pub mod constants;
pub mod face_track;
pub mod object_ref;
pub mod region;

#[cfg(test)]
pub(crate) mod http_stub;
