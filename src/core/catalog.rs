use bytes::Bytes;
use serde_json::Value;

use crate::{
    error::Result,
    models::product::Product,
    state::CatalogConfig,
    utils::join_url,
};

/// HTTP client for the external product catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    products_path: String,
}

impl CatalogClient {
    /// Build a client for the catalog described by `config`
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            products_path: config.products_path.clone(),
        })
    }

    /// Absolute URL for a catalog-relative image path
    pub fn image_url(&self, relative: &str) -> String {
        join_url(&self.base_url, relative)
    }

    /// Products listed for `flower_type`.
    ///
    /// Any failure to reach the catalog or to read its answer degrades to an
    /// empty list; the caller reports "no products" instead of failing.
    pub async fn products_by_flower(&self, flower_type: &str) -> Vec<Product> {
        let url = join_url(&self.base_url, &self.products_path);
        let response = match self
            .http
            .get(&url)
            .query(&[("englishName", flower_type)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Catalog unreachable at {}: {}", url, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            log::warn!(
                "Catalog returned {} for flower type '{}'",
                response.status(),
                flower_type
            );
            return Vec::new();
        }

        let records: Vec<Value> = match response.json().await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Catalog answered with an unreadable product list: {}", e);
                return Vec::new();
            }
        };

        let total = records.len();
        let products: Vec<Product> = records
            .into_iter()
            .filter_map(|record| {
                let product = Product::from_record(record);
                if product.is_none() {
                    log::warn!("Skipping catalog record without a string imageUrl");
                }
                product
            })
            .collect();

        log::debug!(
            "Catalog listed {} products ({} usable) for '{}'",
            total,
            products.len(),
            flower_type
        );
        products
    }

    /// Download raw image bytes; non-success statuses are errors
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }
}
