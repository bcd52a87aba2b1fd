#![doc(html_root_url = "https://docs.rs/flowermatch/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # flowermatch
//!
//! A small image search service for a flower shop catalog: an uploaded photo
//! is classified into one of 102 flower categories, the catalog's products for
//! that category are fetched, and they are ranked by visual similarity to the
//! upload.
//!
//! ## Pipeline
//!
//! - **Flower classifier**: ResNet-50 fine-tuned with a 102-way head
//! - **Catalog client**: lists products by flower name and downloads their images
//! - **Embedding extractor**: ImageNet ResNet-50 without its head, 2048 values per image
//! - **Ranker**: cosine similarity, highest first, top-k kept
//! - **Web API**: `POST /search-by-image` with a multipart `file` field
//!
//! ## Library usage
//!
//! The search pipeline is generic over [`FlowerClassifier`] and
//! [`ImageEmbedder`], so it can be driven without libtorch:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowermatch::{
//!     core::{catalog::CatalogClient, search::SearchService},
//!     state::CatalogConfig,
//!     FlowerClassifier, ImageEmbedder, Result,
//! };
//!
//! async fn run(
//!     classifier: Arc<dyn FlowerClassifier>,
//!     embedder: Arc<dyn ImageEmbedder>,
//!     image: bytes::Bytes,
//! ) -> Result<()> {
//!     let catalog = CatalogClient::new(&CatalogConfig::default())?;
//!     let service = SearchService::new(classifier, embedder, catalog, 3);
//!     let response = service.search(image).await?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

// Internal modules
pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
pub mod models;
/// Configuration and shared request state.
pub mod state;
mod utils;

// Public API exports
pub use crate::{
    core::{
        labels::FLOWER_NAMES,
        similarity::{cosine_similarity, rank_top_k, Embedding},
        FlowerClassifier, ImageEmbedder, EMBEDDING_DIM,
    },
    error::{AppError, Result, ResultExt},
    models::product::{Product, SearchResponse, SimilarProduct},
    state::{AppState, Config},
};

#[cfg(feature = "api")]
pub use crate::api::{create_router, health_check, search_by_image};

#[cfg(feature = "embeddings")]
pub use crate::core::{classifier::ResNetFlowerClassifier, embeddings::ResNetEmbedder};

/// Initialize logging with default settings
///
/// Honors `RUST_LOG`; defaults to `info`. It should be called early in the
/// application startup process.
///
/// # Errors
///
/// Returns an error if a global logger is already installed.
///
/// # Example
///
/// ```no_run
/// use flowermatch::init;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     init()?;
///     // Application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .map_err(|e| AppError::Internal(format!("logger already initialized: {}", e)))?;

    log::info!("Initializing flowermatch {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
