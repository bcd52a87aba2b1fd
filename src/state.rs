use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::{catalog::CatalogClient, search::SearchService, FlowerClassifier, ImageEmbedder};
use crate::error::{AppError, Result};
use crate::utils::env_var;

const ENV_PREFIX: &str = "FLOWERMATCH_";

/// Configuration for the application
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// The only browser origin allowed to call the API
    pub allowed_origin: String,
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
    /// Number of matches returned per search
    pub top_k: usize,
    /// Catalog service location
    pub catalog: CatalogConfig,
    /// Weight files for the two networks
    pub models: ModelConfig,
}

/// Where to find the product catalog
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Base URL; image paths are resolved against it
    pub base_url: String,
    /// Path of the products-by-flower listing
    pub products_path: String,
}

/// Weight files loaded at startup
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Fine-tuned 102-class flower classifier
    pub classifier_weights: PathBuf,
    /// ImageNet-pretrained feature extractor
    pub embedder_weights: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            allowed_origin: String::from("http://localhost:3000"),
            max_upload_size: 10 * 1024 * 1024, // 10MB
            top_k: 3,
            catalog: CatalogConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8080"),
            products_path: String::from("/api/products/by-flower"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_weights: PathBuf::from("models/resnet50_flowers.ot"),
            embedder_weights: PathBuf::from("models/resnet50.ot"),
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and `FLOWERMATCH_*` variables
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }

        let defaults = Self::default();
        let config = Self {
            bind_addr: parse("BIND_ADDR", defaults.bind_addr)?,
            allowed_origin: string("ALLOWED_ORIGIN", defaults.allowed_origin),
            max_upload_size: megabytes(parse("MAX_UPLOAD_MB", defaults.max_upload_size / (1024 * 1024))?)?,
            top_k: parse("TOP_K", defaults.top_k)?,
            catalog: CatalogConfig {
                base_url: string("CATALOG_URL", defaults.catalog.base_url),
                products_path: string("CATALOG_PRODUCTS_PATH", defaults.catalog.products_path),
            },
            models: ModelConfig {
                classifier_weights: path("CLASSIFIER_WEIGHTS", defaults.models.classifier_weights),
                embedder_weights: path("EMBEDDER_WEIGHTS", defaults.models.embedder_weights),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(AppError::Config("TOP_K must be at least 1".to_string()));
        }
        if self.max_upload_size == 0 {
            return Err(AppError::Config("MAX_UPLOAD_MB must be at least 1".to_string()));
        }
        if !self.catalog.base_url.starts_with("http://") && !self.catalog.base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "CATALOG_URL must be an http(s) URL, got '{}'",
                self.catalog.base_url
            )));
        }
        Ok(())
    }
}

fn string(key: &str, default: String) -> String {
    env_var(&format!("{}{}", ENV_PREFIX, key)).unwrap_or(default)
}

fn path(key: &str, default: PathBuf) -> PathBuf {
    env_var(&format!("{}{}", ENV_PREFIX, key))
        .map(PathBuf::from)
        .unwrap_or(default)
}

fn megabytes(mb: usize) -> Result<usize> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| AppError::Config(format!("{}MAX_UPLOAD_MB={} is too large", ENV_PREFIX, mb)))
}

fn parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(&format!("{}{}", ENV_PREFIX, key)) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{}{}='{}': {}", ENV_PREFIX, key, raw, e))),
        None => Ok(default),
    }
}

/// Application state that can be shared across handlers
#[derive(Clone)]
#[derive(Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Search pipeline, holding the shared read-only networks
    pub search: SearchService,
}

impl AppState {
    /// Create the shared state around already-loaded networks
    pub fn new(
        config: Config,
        classifier: Arc<dyn FlowerClassifier>,
        embedder: Arc<dyn ImageEmbedder>,
    ) -> Result<Arc<Self>> {
        let catalog = CatalogClient::new(&config.catalog)?;
        let search = SearchService::new(classifier, embedder, catalog, config.top_k);

        Ok(Arc::new(Self { config, search }))
    }
}
