use utoipa::OpenApi;
use crate::modules::stream::dto::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::stream::handler::upload_video,
        crate::modules::stream::handler::list_videos,
        crate::modules::stream::handler::get_video,
        crate::modules::stream::handler::index,
        crate::modules::stream::handler::player,
        crate::modules::stream::stream_handler::stream_file,
    ),
    components(
        schemas(
            UploadResponse, UploadStatus, VideoEntry, VideoStatusResponse,
            crate::infrastructure::storage::StreamFormat,
        )
    ),
    tags(
        (name = "Streams", description = "Upload, transcoding status and HLS/DASH delivery")
    )
)]
pub struct ApiDoc;
