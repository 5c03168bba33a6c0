use crate::common::ids::JobId;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::ALLOWED_EXTENSIONS;
use crate::infrastructure::storage::StreamFormat;
use crate::modules::stream::dto::*;
use crate::modules::stream::service::StreamService;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};

const INDEX_TEMPLATE: &str = include_str!("../../../templates/index.html");
const PLAYER_TEMPLATE: &str = include_str!("../../../templates/player.html");

/// Upload a video and transcode it to HLS and DASH
///
/// In `sync` mode the response is sent after both conversions were attempted.
/// In `queued` mode the job is accepted with 202 and converted in the background.
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted to both formats", body = ApiResponse<UploadResponse>),
        (status = 202, description = "Accepted for background conversion", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Missing file, empty filename or disallowed extension"),
        (status = 500, description = "Conversion failed", body = ApiResponse<UploadResponse>)
    ),
    tag = "Streams"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = StreamService::accept_upload(&state, multipart).await?;
    let response = StreamService::submit(&state, upload).await?;

    Ok(match response.status {
        UploadStatus::Success => ApiSuccess(
            ApiResponse::success(response, "Video converted successfully"),
            StatusCode::OK,
        ),
        UploadStatus::Queued => ApiSuccess(
            ApiResponse::success(response, "Video queued for conversion"),
            StatusCode::ACCEPTED,
        ),
        UploadStatus::Failed => ApiSuccess(
            ApiResponse::failure(response, "Conversion failed"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    })
}

/// List all videos with the formats currently available
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    responses(
        (status = 200, description = "List videos", body = ApiResponse<Vec<VideoEntry>>),
        (status = 500, description = "Output directory unreadable")
    ),
    tag = "Streams"
)]
pub async fn list_videos(State(state): State<AppState>) -> impl IntoResponse {
    match StreamService::list_videos(&state).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Videos retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError(format!("{:#}", e), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// Derived status of one video
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Video status", body = ApiResponse<VideoStatusResponse>),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Streams"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match StreamService::video_status(&state, &JobId::new(id)).await {
        Ok(Some(res)) => ApiSuccess(ApiResponse::success(res, "Video retrieved successfully"), StatusCode::OK).into_response(),
        Ok(None) => ApiError::not_found("Video not found").into_response(),
        Err(e) => ApiError(format!("{:#}", e), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// Upload form
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "HTML upload form", body = String, content_type = "text/html")
    ),
    tag = "Streams"
)]
pub async fn index() -> Html<String> {
    Html(INDEX_TEMPLATE.replace("{{allowed_extensions}}", &ALLOWED_EXTENSIONS.join(", ")))
}

/// Player page for one video
#[utoipa::path(
    get,
    path = "/player/{id}",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "HTML player", body = String, content_type = "text/html"),
        (status = 404, description = "Invalid job id")
    ),
    tag = "Streams"
)]
pub async fn player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = JobId::new(id);
    if !id.is_path_safe() {
        return ApiError::not_found("Video not found").into_response();
    }
    Html(render_player(&state, &id)).into_response()
}

fn render_player(state: &AppState, id: &JobId) -> String {
    // Only characters that are inert in both HTML and JS string literals.
    let escaped: String = id
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let escaped_id = JobId::new(escaped);

    PLAYER_TEMPLATE
        .replace("{{video_id}}", escaped_id.as_str())
        .replace("{{hls_url}}", &state.layout.manifest_url(&escaped_id, StreamFormat::Hls))
        .replace("{{dash_url}}", &state.layout.manifest_url(&escaped_id, StreamFormat::Dash))
}
