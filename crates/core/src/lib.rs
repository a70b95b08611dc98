pub mod auth;
pub mod blurring;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod storage;
