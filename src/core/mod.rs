//! Core functionality: preprocessing, inference, catalog access and ranking

/// Fetches candidate products and their images from the catalog service.
pub mod catalog;
/// Flower label vocabulary.
pub mod labels;
/// Image decoding and the per-network preprocessing pipelines.
pub mod preprocess;
/// Classify → fetch → embed → rank orchestration.
pub mod search;
/// Cosine similarity and top-k ranking.
pub mod similarity;

#[cfg(feature = "embeddings")]
/// ResNet-50 flower classifier.
pub mod classifier;
#[cfg(feature = "embeddings")]
/// ResNet-50 feature extractor.
pub mod embeddings;
#[cfg(feature = "embeddings")]
mod network;

use crate::error::Result;
use similarity::Embedding;

/// Length of the vectors produced by the feature extractor
pub const EMBEDDING_DIM: usize = 2048;

/// Maps an image to exactly one label of the flower vocabulary.
///
/// Implementations must be callable concurrently from many requests.
pub trait FlowerClassifier: Send + Sync {
    /// Classify encoded image bytes
    fn classify(&self, image: &[u8]) -> Result<&'static str>;
}

/// Maps an image to a fixed-length feature vector.
pub trait ImageEmbedder: Send + Sync {
    /// Embed encoded image bytes
    fn embed(&self, image: &[u8]) -> Result<Embedding>;
}
