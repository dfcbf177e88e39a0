//! Volume pricing
//!
//! A product carries a base unit price and a table of [`PriceBreak`]s. The
//! engine picks the cheapest unit price the requested quantity qualifies
//! for. Every consumer (cart summary, quotes, the price preview endpoint)
//! goes through [`best_price`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A quantity threshold at which a reduced unit price becomes available.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreak {
    /// Inclusive threshold.
    pub min_qty: u32,
    pub price: Decimal,
}

impl PriceBreak {
    pub fn new(min_qty: u32, price: Decimal) -> Self { Self { min_qty, price } }
    pub fn applies_to(&self, quantity: i64) -> bool { i64::from(self.min_qty) <= quantity }
}

/// Outcome of pricing one quantity of one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub base_price: Decimal,
    pub unit_price: Decimal,
    pub discounted: bool,
    pub discount_percent: i64,
}

impl PriceResult {
    fn undiscounted(base_price: Decimal) -> Self {
        Self { base_price, unit_price: base_price, discounted: false, discount_percent: 0 }
    }

    pub fn total(&self, quantity: u32) -> Decimal { self.unit_price * Decimal::from(quantity) }

    pub fn savings(&self, quantity: u32) -> Decimal {
        (self.base_price - self.unit_price) * Decimal::from(quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidQuantity(i64),

    #[error("Invalid base price {0}: must be positive")]
    InvalidPrice(Decimal),
}

/// Effective unit price for `quantity` units.
///
/// Among the breaks whose `min_qty` the quantity reaches, the one with the
/// lowest price wins, whatever its threshold. Break order does not matter.
pub fn best_price(base_price: Decimal, price_breaks: &[PriceBreak], quantity: i64) -> Result<PriceResult, PricingError> {
    if quantity < 1 { return Err(PricingError::InvalidQuantity(quantity)); }
    ensure_positive(base_price)?;

    let best = price_breaks
        .iter()
        .filter(|b| b.applies_to(quantity))
        .min_by_key(|b| b.price);

    let Some(best) = best else { return Ok(PriceResult::undiscounted(base_price)); };

    Ok(PriceResult {
        base_price,
        unit_price: best.price,
        discounted: best.price < base_price,
        discount_percent: discount_percent(base_price, best.price),
    })
}

/// One row of a product's volume pricing table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTier {
    pub min_qty: u32,
    /// `None` for the open-ended last tier.
    pub max_qty: Option<u32>,
    pub unit_price: Decimal,
    pub discount_percent: i64,
}

/// Volume pricing table sorted by threshold, starting with the base price
/// row for quantities below the first break.
pub fn volume_tiers(base_price: Decimal, price_breaks: &[PriceBreak]) -> Result<Vec<VolumeTier>, PricingError> {
    ensure_positive(base_price)?;

    let mut sorted = price_breaks.to_vec();
    sorted.sort_by_key(|b| b.min_qty);

    let mut tiers = Vec::with_capacity(sorted.len() + 1);
    match sorted.first() {
        None => tiers.push(VolumeTier { min_qty: 1, max_qty: None, unit_price: base_price, discount_percent: 0 }),
        Some(first) if first.min_qty > 1 => tiers.push(VolumeTier {
            min_qty: 1,
            max_qty: Some(first.min_qty - 1),
            unit_price: base_price,
            discount_percent: 0,
        }),
        Some(_) => {}
    }

    for (i, current) in sorted.iter().enumerate() {
        let next_threshold = sorted[i + 1..].iter().map(|b| b.min_qty).find(|&m| m > current.min_qty);
        tiers.push(VolumeTier {
            min_qty: current.min_qty,
            max_qty: next_threshold.map(|m| m - 1),
            unit_price: current.price,
            discount_percent: discount_percent(base_price, current.price),
        });
    }
    Ok(tiers)
}

// Rounds half away from zero (12.5 -> 13, -12.5 -> -13). A break priced
// above the base price yields a negative percentage.
fn discount_percent(base_price: Decimal, price: Decimal) -> i64 {
    ((base_price - price) / base_price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

fn ensure_positive(base_price: Decimal) -> Result<(), PricingError> {
    if base_price <= Decimal::ZERO { return Err(PricingError::InvalidPrice(base_price)); }
    Ok(())
}
