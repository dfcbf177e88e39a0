//! Cart Aggregate
//!
//! A cart is a value: every operation returns a new `Cart` and leaves the
//! receiver untouched. Lines are keyed by product and selected variant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::product::{Product, ProductError, ProductId};
use crate::domain::pricing::PricingError;
use crate::domain::value_objects::{Money, MoneyError, Sku};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    id: Uuid,
    currency: String,
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl CartItem {
    fn matches(&self, product_id: ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        self.product.id() == product_id && self.color.as_deref() == color && self.size.as_deref() == size
    }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self { id: Uuid::new_v4(), currency: currency.to_string(), items: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn total_items(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Adds `quantity` units, merging into an existing line for the same
    /// product and variant. Line quantities are capped at the product's
    /// purchase limit.
    pub fn with_item(&self, product: &Product, quantity: u32, color: Option<&str>, size: Option<&str>) -> Result<Cart, CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if !product.is_purchasable() { return Err(CartError::NotAvailable(product.id())); }
        product.validate_variant(color, size)?;

        let limit = product.purchase_limit();
        let mut next = self.clone();
        match next.items.iter_mut().find(|i| i.matches(product.id(), color, size)) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity).min(limit),
            None => next.items.push(CartItem {
                product: product.clone(),
                quantity: quantity.min(limit),
                color: color.map(str::to_string),
                size: size.map(str::to_string),
            }),
        }
        Ok(next)
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn with_quantity(&self, product_id: ProductId, color: Option<&str>, size: Option<&str>, quantity: u32) -> Result<Cart, CartError> {
        if quantity == 0 { return self.without_item(product_id, color, size); }
        let mut next = self.clone();
        let item = next.items.iter_mut().find(|i| i.matches(product_id, color, size)).ok_or(CartError::ItemNotFound(product_id))?;
        item.quantity = quantity.min(item.product.purchase_limit());
        Ok(next)
    }

    pub fn without_item(&self, product_id: ProductId, color: Option<&str>, size: Option<&str>) -> Result<Cart, CartError> {
        if !self.items.iter().any(|i| i.matches(product_id, color, size)) { return Err(CartError::ItemNotFound(product_id)); }
        let mut next = self.clone();
        next.items.retain(|i| !i.matches(product_id, color, size));
        Ok(next)
    }

    pub fn cleared(&self) -> Cart { Cart { id: self.id, currency: self.currency.clone(), items: vec![] } }

    /// Prices every line through the volume pricing engine.
    pub fn summary(&self) -> Result<CartSummary, CartError> {
        let mut lines = Vec::with_capacity(self.items.len());
        let mut subtotal = Money::new(Decimal::ZERO, &self.currency);
        let mut total = subtotal.clone();

        for item in &self.items {
            let price = item.product.price_for(item.quantity)?;
            let base_total = item.product.base_money(&self.currency).multiply(item.quantity);
            let unit_price = Money::new(price.unit_price, &self.currency);
            let line_total = unit_price.multiply(item.quantity);
            subtotal = subtotal.add(&base_total)?;
            total = total.add(&line_total)?;
            lines.push(CartLine {
                product_id: item.product.id(),
                sku: item.product.sku().clone(),
                name: item.product.name().to_string(),
                color: item.color.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
                savings: base_total.subtract(&line_total)?,
                unit_price,
                line_total,
                discounted: price.discounted,
                discount_percent: price.discount_percent,
            });
        }

        Ok(CartSummary {
            total_items: self.total_items(),
            lines,
            savings: subtotal.subtract(&total)?,
            subtotal,
            total,
        })
    }
}

/// Priced view of a cart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartSummary {
    pub total_items: u32,
    pub lines: Vec<CartLine>,
    /// Sum of lines at base price.
    pub subtotal: Money,
    pub savings: Money,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub savings: Money,
    pub discounted: bool,
    pub discount_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Product {0} is not available for purchase")]
    NotAvailable(ProductId),
    #[error("Product {0} is not in the cart")]
    ItemNotFound(ProductId),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::PriceBreak;

    fn d(v: i64) -> Decimal { Decimal::new(v, 0) }

    fn mug() -> Product {
        Product::new(1, Sku::new("MUG-1").unwrap(), "Taza", d(1000))
            .with_stock(500)
            .with_colors(&["Negro", "Blanco"])
            .with_price_breaks(vec![PriceBreak::new(10, d(900)), PriceBreak::new(100, d(800))])
    }

    fn pen() -> Product {
        Product::new(2, Sku::new("PEN-1").unwrap(), "Lapiz", d(500)).with_stock(30)
    }

    #[test]
    fn test_cart_operations() {
        let cart = Cart::new("CLP");
        let cart = cart.with_item(&mug(), 2, Some("Negro"), None).unwrap();
        assert_eq!(cart.items().len(), 1);
        let cart = cart.with_item(&mug(), 3, Some("Negro"), None).unwrap();
        assert_eq!(cart.items()[0].quantity, 5); // Merged
        let cart = cart.with_item(&mug(), 1, Some("Blanco"), None).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total_items(), 6);
    }

    #[test]
    fn test_mutations_leave_original_untouched() {
        let empty = Cart::new("CLP");
        let one = empty.with_item(&pen(), 1, None, None).unwrap();
        assert!(empty.is_empty());
        let cleared = one.cleared();
        assert_eq!(one.total_items(), 1);
        assert!(cleared.is_empty());
        assert_eq!(cleared.id(), one.id());
    }

    #[test]
    fn test_quantities_capped_at_stock() {
        let cart = Cart::new("CLP").with_item(&pen(), 50, None, None).unwrap();
        assert_eq!(cart.items()[0].quantity, 30);
        let cart = Cart::new("CLP").with_item(&pen(), 20, None, None).unwrap().with_item(&pen(), 20, None, None).unwrap();
        assert_eq!(cart.items()[0].quantity, 30);
        let cart = cart.with_quantity(2, None, None, 99).unwrap();
        assert_eq!(cart.items()[0].quantity, 30);
    }

    #[test]
    fn test_rejects_bad_additions() {
        let cart = Cart::new("CLP");
        assert_eq!(cart.with_item(&pen(), 0, None, None), Err(CartError::InvalidQuantity));
        assert_eq!(cart.with_item(&pen().with_stock(0), 1, None, None), Err(CartError::NotAvailable(2)));
        assert_eq!(
            cart.with_item(&mug(), 1, Some("Rojo"), None),
            Err(CartError::Product(ProductError::UnknownColor("Rojo".into())))
        );
    }

    #[test]
    fn test_zero_purchase_limit_is_not_available() {
        let capped = pen().with_stock(10).with_max_quantity(0);
        assert_eq!(Cart::new("CLP").with_item(&capped, 3, None, None), Err(CartError::NotAvailable(2)));
    }

    #[test]
    fn test_update_and_remove() {
        let cart = Cart::new("CLP").with_item(&mug(), 5, Some("Negro"), None).unwrap();
        assert_eq!(cart.with_quantity(1, None, None, 3), Err(CartError::ItemNotFound(1)));
        let cart = cart.with_quantity(1, Some("Negro"), None, 12).unwrap();
        assert_eq!(cart.items()[0].quantity, 12);
        assert!(cart.with_quantity(1, Some("Negro"), None, 0).unwrap().is_empty());
        assert!(cart.without_item(1, Some("Negro"), None).unwrap().is_empty());
        assert_eq!(cart.without_item(2, None, None), Err(CartError::ItemNotFound(2)));
    }

    #[test]
    fn test_summary_applies_volume_pricing() {
        let cart = Cart::new("CLP")
            .with_item(&mug(), 150, Some("Negro"), None).unwrap()
            .with_item(&pen(), 4, None, None).unwrap();
        let summary = cart.summary().unwrap();

        assert_eq!(summary.total_items, 154);
        let mug_line = &summary.lines[0];
        assert_eq!(mug_line.unit_price.amount(), d(800));
        assert_eq!(mug_line.line_total.amount(), d(120_000));
        assert_eq!(mug_line.savings.amount(), d(30_000));
        assert_eq!(mug_line.discount_percent, 20);
        assert!(!summary.lines[1].discounted);

        assert_eq!(summary.subtotal.amount(), d(152_000));
        assert_eq!(summary.total.amount(), d(122_000));
        assert_eq!(summary.savings.amount(), d(30_000));
        assert_eq!(summary.total.currency(), "CLP");
    }
}
