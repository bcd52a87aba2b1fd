//! API module for handling HTTP requests and responses

#[cfg(feature = "api")]
pub(crate) mod handlers;
#[cfg(feature = "api")]
pub(crate) mod responses;

#[cfg(feature = "api")]
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
#[cfg(feature = "api")]
use std::sync::Arc;
#[cfg(feature = "api")]
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use crate::{
    error::{AppError, Result},
    state::AppState,
};

#[cfg(feature = "api")]
pub use handlers::search_by_image;
#[cfg(feature = "api")]
pub use responses::HealthResponse;

#[cfg(feature = "api")]
/// Create the application router with all routes.
///
/// Only `config.allowed_origin` receives CORS headers. Requests from any
/// other origin are not refused: the handler still runs and responds, just
/// without `Access-Control-Allow-Origin`, so enforcement is left to the
/// browser. Non-browser clients are not restricted by this layer.
pub fn create_router(state: Arc<AppState>) -> Result<Router> {
    let origin = HeaderValue::from_str(&state.config.allowed_origin).map_err(|e| {
        AppError::Config(format!(
            "invalid allowed origin '{}': {}",
            state.config.allowed_origin, e
        ))
    })?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_size = state.config.max_upload_size;

    Ok(Router::new()
        .route("/api/health", get(health_check))
        .route("/search-by-image", post(search_by_image))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

#[cfg(feature = "api")]
/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
