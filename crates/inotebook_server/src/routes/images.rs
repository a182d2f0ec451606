//! `/api/images`: profile image upload, delete and fetch.

use crate::error::ApiError;
use crate::extract::{AppPath, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{delete, get, post};
use axum::Router;
use inotebook_core::{ImageId, ImageUpload};

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
const IMAGE_FIELD: &str = "image";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/delete/:id", delete(delete_image))
        .route("/fetchImage", get(fetch_image))
}

async fn upload(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse, ApiError> {
    let upload = read_image_field(multipart?)
        .await?
        .ok_or_else(|| ApiError::validation("No file uploaded"))?;
    let image = state
        .run(move |state, conn| state.images(conn)?.upload(principal.id, &upload))
        .await?;
    ApiResponse::created("Image uploaded successfully").with("image", image)
}

async fn read_image_field(mut multipart: Multipart) -> Result<Option<ImageUpload>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

async fn delete_image(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppPath(id): AppPath<ImageId>,
) -> Result<ApiResponse, ApiError> {
    state
        .run(move |state, conn| state.images(conn)?.delete(principal.id, id))
        .await?;
    Ok(ApiResponse::ok("Image deleted successfully"))
}

async fn fetch_image(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse, ApiError> {
    let image = state
        .run(move |state, conn| state.images(conn)?.fetch(principal.id))
        .await?;
    ApiResponse::ok("Image fetched successfully")
        .with("imageUrl", &image.image_url)?
        .with("imageId", image.id)
}
