use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use crate::state::AppState;

pub mod dto;
pub mod events;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod stream_handler;

/// JSON API, nested under `/api/v1`.
pub fn api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(handler::upload_video)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/videos", get(handler::list_videos))
        .route("/videos/{id}", get(handler::get_video))
}

/// Public pages and artifact routes. Their paths are part of the published URL scheme.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::index))
        .route("/stream/{id}/{format}/{*file}", get(stream_handler::stream_file))
        .route("/player/{id}", get(handler::player))
}
