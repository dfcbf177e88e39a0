//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::pricing::{self, PriceBreak, PriceResult, PricingError, VolumeTier};
use crate::domain::value_objects::{Money, Sku};

pub type ProductId = u32;

/// Catalog entry. Products are read-only once the catalog is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    sku: Sku,
    name: String,
    #[serde(default)]
    description: String,
    category: String,
    supplier: String,
    base_price: Decimal,
    stock: u32,
    #[serde(default)]
    max_quantity: Option<u32>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
    #[serde(default)]
    price_breaks: Vec<PriceBreak>,
    #[serde(default)]
    status: ProductStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { #[default] Active, Inactive, Discontinued }

impl Product {
    pub fn new(id: ProductId, sku: Sku, name: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            id, sku, name: name.into(), description: String::new(), category: String::new(),
            supplier: String::new(), base_price, stock: 0, max_quantity: None, colors: vec![],
            sizes: vec![], price_breaks: vec![], status: ProductStatus::Active,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self { self.supplier = supplier.into(); self }
    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = stock; self }
    pub fn with_max_quantity(mut self, max: u32) -> Self { self.max_quantity = Some(max); self }
    pub fn with_price_breaks(mut self, breaks: Vec<PriceBreak>) -> Self { self.price_breaks = breaks; self }
    pub fn with_colors(mut self, colors: &[&str]) -> Self { self.colors = colors.iter().map(|c| c.to_string()).collect(); self }
    pub fn with_sizes(mut self, sizes: &[&str]) -> Self { self.sizes = sizes.iter().map(|s| s.to_string()).collect(); self }
    pub fn with_status(mut self, status: ProductStatus) -> Self { self.status = status; self }

    pub fn id(&self) -> ProductId { self.id }
    pub fn sku(&self) -> &Sku { &self.sku }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> &str { &self.category }
    pub fn supplier(&self) -> &str { &self.supplier }
    pub fn base_price(&self) -> Decimal { self.base_price }
    pub fn stock(&self) -> u32 { self.stock }
    pub fn max_quantity(&self) -> Option<u32> { self.max_quantity }
    pub fn colors(&self) -> &[String] { &self.colors }
    pub fn sizes(&self) -> &[String] { &self.sizes }
    pub fn price_breaks(&self) -> &[PriceBreak] { &self.price_breaks }
    pub fn status(&self) -> &ProductStatus { &self.status }

    pub fn base_money(&self, currency: &str) -> Money { Money::new(self.base_price, currency) }

    /// Largest quantity a single cart line may hold.
    pub fn purchase_limit(&self) -> u32 { self.max_quantity.map_or(self.stock, |max| max.min(self.stock)) }

    /// Active, and at least one unit can go into a cart line.
    pub fn is_purchasable(&self) -> bool { self.status == ProductStatus::Active && self.purchase_limit() > 0 }

    pub fn price_for(&self, quantity: u32) -> Result<PriceResult, PricingError> {
        pricing::best_price(self.base_price, &self.price_breaks, i64::from(quantity))
    }

    pub fn volume_tiers(&self) -> Result<Vec<VolumeTier>, PricingError> {
        pricing::volume_tiers(self.base_price, &self.price_breaks)
    }

    /// Checks a purchase quantity against stock and the per-order cap.
    pub fn validate_quantity(&self, quantity: u32) -> Result<(), ProductError> {
        if quantity == 0 { return Err(ProductError::QuantityBelowMinimum); }
        if quantity > self.stock { return Err(ProductError::InsufficientStock { requested: quantity, available: self.stock }); }
        if let Some(max) = self.max_quantity {
            if quantity > max { return Err(ProductError::AboveMaxQuantity { requested: quantity, max }); }
        }
        Ok(())
    }

    pub fn validate_variant(&self, color: Option<&str>, size: Option<&str>) -> Result<(), ProductError> {
        if let Some(color) = color {
            if !self.colors.iter().any(|c| c == color) { return Err(ProductError::UnknownColor(color.to_string())); }
        }
        if let Some(size) = size {
            if !self.sizes.iter().any(|s| s == size) { return Err(ProductError::UnknownSize(size.to_string())); }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Minimum quantity is 1")]
    QuantityBelowMinimum,
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Maximum quantity per order is {max}, requested {requested}")]
    AboveMaxQuantity { requested: u32, max: u32 },
    #[error("Color not offered: {0}")]
    UnknownColor(String),
    #[error("Size not offered: {0}")]
    UnknownSize(String),
}
