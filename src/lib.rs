//! SWAG Catalog
//!
//! Promotional products catalog with volume pricing.
//!
//! ## Features
//! - Product catalog with filtering, sorting and facets
//! - Volume price breaks (best applicable unit price per quantity)
//! - Shopping cart with priced summaries
//! - Single-product quotations
//! - JSON HTTP API

pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;

use thiserror::Error;

pub use catalog::{Catalog, CatalogError, ProductQuery, SortBy};
pub use config::Config;
pub use domain::aggregates::{Cart, CartError, Product, ProductError, Quote, QuoteError, QuoteRequest};
pub use domain::pricing::{best_price, PriceBreak, PriceResult, PricingError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogServiceError {
    #[error("Product not found: {0}")]
    ProductNotFound(u32),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Cart store is full ({0} sessions)")]
    CartCapacity(usize),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<validator::ValidationErrors> for CatalogServiceError {
    fn from(errors: validator::ValidationErrors) -> Self { Self::Validation(errors.to_string()) }
}

pub type Result<T> = std::result::Result<T, CatalogServiceError>;
