use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, Result},
    models::product::SearchResponse,
    AppState,
};

/// Multipart field carrying the query image
const FILE_FIELD: &str = "file";

/// `POST /search-by-image`: classify the uploaded image and return similar products
pub async fn search_by_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>> {
    let mut upload = None;

    // Process the multipart form data
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().unwrap_or("unknown").to_string();
            let content = field.bytes().await?;
            log::debug!("Received upload '{}' ({} bytes)", file_name, content.len());
            upload = Some(content);
        }
    }

    let image = upload.ok_or_else(|| AppError::UploadError("No file provided".to_string()))?;
    if image.is_empty() {
        return Err(AppError::UploadError("Uploaded file is empty".to_string()));
    }

    let response = state.search.search(image).await?;
    log::info!(
        "Search for '{}' returned {} entries",
        response.flower_type,
        response.similar_products.len()
    );

    Ok(Json(response))
}
