//! Quote Aggregate

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;
use crate::domain::aggregates::product::{Product, ProductError, ProductId};
use crate::domain::pricing::{PricingError, VolumeTier};
use crate::domain::value_objects::{Money, Sku};

/// Cap applied when a product has no `max_quantity` of its own.
pub const DEFAULT_QUOTE_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct QuoteRequest {
    pub product_id: ProductId,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[validate]
    pub company: CompanyData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct CompanyData {
    #[validate(length(min = 1))]
    pub company_name: String,
    #[validate(length(min = 1))]
    pub contact_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Chilean tax id.
    #[serde(default)]
    pub rut: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub company: CompanyData,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Sku,
    pub category: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub base_price: Money,
    pub unit_price: Money,
    pub total: Money,
    pub savings: Money,
    pub discounted: bool,
    pub discount_percent: i64,
    pub volume_tiers: Vec<VolumeTier>,
}

impl Quote {
    /// Prices `request` against `product`. Stock is not checked: a quote is
    /// an offer for a future order, only the per-order cap applies.
    pub fn build(product: &Product, request: &QuoteRequest, issued_at: DateTime<Utc>, validity_days: i64, currency: &str) -> Result<Quote, QuoteError> {
        if request.product_id != product.id() {
            return Err(QuoteError::ProductMismatch { requested: request.product_id, product: product.id() });
        }
        let max = product.max_quantity().unwrap_or(DEFAULT_QUOTE_LIMIT);
        if request.quantity > max {
            return Err(QuoteError::Product(ProductError::AboveMaxQuantity { requested: request.quantity, max }));
        }
        product.validate_variant(request.color.as_deref(), request.size.as_deref())?;

        let price = product.price_for(request.quantity)?;
        let money = |amount| Money::new(amount, currency);

        Ok(Quote {
            number: format!("COT-{}", issued_at.timestamp_millis()),
            issued_at,
            valid_until: issued_at + Duration::days(validity_days),
            company: request.company.clone(),
            product_id: product.id(),
            product_name: product.name().to_string(),
            sku: product.sku().clone(),
            category: product.category().to_string(),
            color: request.color.clone(),
            size: request.size.clone(),
            quantity: request.quantity,
            base_price: product.base_money(currency),
            unit_price: money(price.unit_price),
            total: money(price.total(request.quantity)),
            savings: money(price.savings(request.quantity)),
            discounted: price.discounted,
            discount_percent: price.discount_percent,
            volume_tiers: product.volume_tiers()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Quote requested for product {requested} but priced against {product}")]
    ProductMismatch { requested: ProductId, product: ProductId },
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use crate::domain::pricing::PriceBreak;

    fn d(v: i64) -> Decimal { Decimal::new(v, 0) }

    fn cap() -> Product {
        Product::new(3, Sku::new("CAP-9").unwrap(), "Jockey Bordado", d(1000))
            .with_category("textil")
            .with_stock(20)
            .with_colors(&["Rojo"])
            .with_price_breaks(vec![PriceBreak::new(10, d(900)), PriceBreak::new(100, d(800))])
    }

    fn request(quantity: u32) -> QuoteRequest {
        QuoteRequest {
            product_id: 3,
            quantity,
            color: Some("Rojo".into()),
            size: None,
            company: CompanyData {
                company_name: "ACME Corp".into(),
                contact_name: "Juan Perez".into(),
                email: "compras@acme.cl".into(),
                phone: "+56 9 1234 5678".into(),
                rut: "12.345.678-9".into(),
            },
        }
    }

    #[test]
    fn test_quote_prices_volume() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let quote = Quote::build(&cap(), &request(150), issued, 30, "CLP").unwrap();

        assert_eq!(quote.number, format!("COT-{}", issued.timestamp_millis()));
        assert_eq!(quote.valid_until, Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap());
        assert_eq!(quote.unit_price.amount(), d(800));
        assert_eq!(quote.total.amount(), d(120_000));
        assert_eq!(quote.savings.amount(), d(30_000));
        assert_eq!(quote.discount_percent, 20);
        assert_eq!(quote.volume_tiers.len(), 3);
        assert_eq!(quote.sku.as_str(), "CAP-9");
    }

    #[test]
    fn test_quote_ignores_stock_but_enforces_cap() {
        let issued = Utc::now();
        assert!(Quote::build(&cap(), &request(1000), issued, 30, "CLP").is_ok());
        assert_eq!(
            Quote::build(&cap(), &request(1001), issued, 30, "CLP"),
            Err(QuoteError::Product(ProductError::AboveMaxQuantity { requested: 1001, max: DEFAULT_QUOTE_LIMIT }))
        );
        let capped = cap().with_max_quantity(50);
        assert!(Quote::build(&capped, &request(51), issued, 30, "CLP").is_err());
    }

    #[test]
    fn test_quote_rejects_zero_and_wrong_variant() {
        let issued = Utc::now();
        assert!(matches!(Quote::build(&cap(), &request(0), issued, 30, "CLP"), Err(QuoteError::Pricing(PricingError::InvalidQuantity(0)))));
        let mut wrong = request(5);
        wrong.color = Some("Verde".into());
        assert!(matches!(Quote::build(&cap(), &wrong, issued, 30, "CLP"), Err(QuoteError::Product(ProductError::UnknownColor(_)))));
    }

    #[test]
    fn test_request_validation() {
        assert!(request(5).validate().is_ok());
        assert!(request(0).validate().is_err());
        let mut missing = request(5);
        missing.company.email = "not-an-email".into();
        assert!(missing.validate().is_err());
        missing = request(5);
        missing.company.company_name.clear();
        assert!(missing.validate().is_err());
    }
}
