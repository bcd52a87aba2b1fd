use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product record as returned by the catalog service.
///
/// Only `imageUrl` is read by this service; every other field is carried
/// through to the response untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Image path relative to the catalog base URL
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    /// Absolute image URL, filled in once the image has been fetched
    #[serde(
        rename = "fullImageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_image_url: Option<String>,
    /// Remaining display fields, opaque to this service
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Product {
    /// Parse one catalog record, returning `None` when it has no usable `imageUrl`.
    pub fn from_record(record: Value) -> Option<Self> {
        serde_json::from_value(record).ok()
    }

    /// Attach the resolved absolute image URL
    pub fn with_full_image_url(mut self, url: impl Into<String>) -> Self {
        self.full_image_url = Some(url.into());
        self
    }
}

/// One entry of the `similar_products` list.
///
/// Either a scored product or the single "no data" entry emitted when
/// nothing could be ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimilarProduct {
    /// A catalog product with its cosine similarity to the query image
    Match {
        /// The decorated catalog record
        product: Product,
        /// Cosine similarity in [-1, 1]
        similarity: f32,
    },
    /// Nothing could be scored
    NoData {
        /// Human readable reason
        error: String,
    },
}

impl SimilarProduct {
    /// The entry used when the catalog had nothing for `flower_type`
    pub fn no_products(flower_type: &str) -> Self {
        Self::NoData {
            error: format!("No products found for flower type '{}'", flower_type),
        }
    }

    /// The entry used when every candidate image failed to download or decode
    pub fn no_vectors() -> Self {
        Self::NoData {
            error: "No vectors extracted from images".to_string(),
        }
    }

    /// Similarity score, if this is a match
    pub fn similarity(&self) -> Option<f32> {
        match self {
            Self::Match { similarity, .. } => Some(*similarity),
            Self::NoData { .. } => None,
        }
    }
}

/// Body returned by `POST /search-by-image`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Predicted flower label
    pub flower_type: String,
    /// Ranked matches, or a single `NoData` entry
    pub similar_products: Vec<SimilarProduct>,
}
