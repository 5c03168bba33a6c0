//! Upload-to-stream service: accepts a video, transcodes it to HLS and DASH
//! with ffmpeg, and serves the manifests and segments over HTTP.

pub mod app;
pub mod common;
pub mod config;
pub mod docs;
pub mod infrastructure;
pub mod modules;
pub mod routes;
pub mod state;
pub mod workers;
