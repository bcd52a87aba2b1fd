use std::sync::Arc;

use bytes::Bytes;

use crate::core::{
    catalog::CatalogClient,
    similarity::{rank_top_k, Embedding},
    FlowerClassifier, ImageEmbedder,
};
use crate::error::Result;
use crate::models::product::{Product, SearchResponse, SimilarProduct};

/// Wires classifier, catalog and embedder together for one uploaded image.
///
/// Every step runs sequentially; inference calls are moved onto the
/// blocking pool one at a time.
#[derive(Clone)]
pub struct SearchService {
    classifier: Arc<dyn FlowerClassifier>,
    embedder: Arc<dyn ImageEmbedder>,
    catalog: CatalogClient,
    top_k: usize,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("catalog", &self.catalog)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl SearchService {
    /// Create a service returning at most `top_k` matches per request
    pub fn new(
        classifier: Arc<dyn FlowerClassifier>,
        embedder: Arc<dyn ImageEmbedder>,
        catalog: CatalogClient,
        top_k: usize,
    ) -> Self {
        Self {
            classifier,
            embedder,
            catalog,
            top_k,
        }
    }

    /// Classify the upload, then rank the catalog's products for that label.
    ///
    /// Only a failure on the uploaded image itself is an error; catalog and
    /// candidate problems show up as a `NoData` entry.
    pub async fn search(&self, image: Bytes) -> Result<SearchResponse> {
        let flower_type = self.classify(image.clone()).await?;
        log::info!("Classified upload as '{}'", flower_type);

        let query = self.embed(image).await?;
        let similar_products = self.similar_products(&query, flower_type).await;

        Ok(SearchResponse {
            flower_type: flower_type.to_string(),
            similar_products,
        })
    }

    /// Rank the catalog's `flower_type` products against `query`
    pub async fn similar_products(&self, query: &Embedding, flower_type: &str) -> Vec<SimilarProduct> {
        let products = self.catalog.products_by_flower(flower_type).await;
        if products.is_empty() {
            return vec![SimilarProduct::no_products(flower_type)];
        }

        let listed = products.len();
        let mut candidates = Vec::with_capacity(listed);
        for product in products {
            if let Some(candidate) = self.candidate(product, query.len()).await {
                candidates.push(candidate);
            }
        }

        log::debug!(
            "Ranking {} of {} '{}' products",
            candidates.len(),
            listed,
            flower_type
        );
        rank_top_k(query, candidates, self.top_k)
    }

    /// Fetch and embed one product image; failures are logged and dropped
    async fn candidate(&self, product: Product, dim: usize) -> Option<(Product, Embedding)> {
        let url = self.catalog.image_url(&product.image_url);

        let vector = match self.catalog.fetch_image(&url).await {
            Ok(bytes) => self.embed(bytes).await,
            Err(e) => Err(e),
        };

        match vector {
            Ok(vector) if vector.len() == dim => Some((product.with_full_image_url(url), vector)),
            Ok(vector) => {
                log::warn!(
                    "Error processing image {}: embedding has {} values, expected {}",
                    url,
                    vector.len(),
                    dim
                );
                None
            }
            Err(e) => {
                log::warn!("Error processing image {}: {}", url, e);
                None
            }
        }
    }

    async fn classify(&self, image: Bytes) -> Result<&'static str> {
        let classifier = Arc::clone(&self.classifier);
        tokio::task::spawn_blocking(move || classifier.classify(&image)).await?
    }

    async fn embed(&self, image: Bytes) -> Result<Embedding> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed(&image)).await?
    }
}
