//! Data types exchanged with the catalog service and returned to clients

/// Catalog product records and ranked search results.
pub mod product;
