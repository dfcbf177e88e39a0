//! Product catalog
//!
//! The catalog is loaded once at start-up (bundled JSON or a file named by
//! configuration) and is read-only afterwards.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{Product, ProductId};

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate product id {0}")]
    DuplicateId(ProductId),

    #[error("Product {0} has a non-positive base price")]
    InvalidBasePrice(ProductId),

    #[error("Product {id} has an invalid price break at {min_qty} units")]
    InvalidPriceBreak { id: ProductId, min_qty: u32 },

    #[error("Product {0} has a maximum order quantity of 0")]
    InvalidMaxQuantity(ProductId),
}

/// Filter and ordering for catalog listings. Unset fields do not filter.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: SortBy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Alphabetical, case-insensitive.
    #[default]
    Name,
    /// Most expensive first.
    Price,
    /// Best stocked first.
    Stock,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub name: String,
    pub count: usize,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id()) { return Err(CatalogError::DuplicateId(product.id())); }
            validate_product(product)?;
        }
        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn bundled() -> Result<Self, CatalogError> { Self::from_json(BUNDLED_CATALOG) }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id() == id)
    }

    pub fn search(&self, query: &ProductQuery) -> Vec<&Product> {
        let category = selected(&query.category);
        let supplier = selected(&query.supplier);
        let needle = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);

        let mut found: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category() == c))
            .filter(|p| supplier.map_or(true, |s| p.supplier() == s))
            .filter(|p| query.min_price.map_or(true, |min| p.base_price() >= min))
            .filter(|p| query.max_price.map_or(true, |max| p.base_price() <= max))
            .filter(|p| {
                needle.as_deref().map_or(true, |n| {
                    p.name().to_lowercase().contains(n) || p.sku().as_str().to_lowercase().contains(n)
                })
            })
            .collect();

        match query.sort {
            SortBy::Name => found.sort_by_cached_key(|p| p.name().to_lowercase()),
            SortBy::Price => found.sort_by_key(|p| Reverse(p.base_price())),
            SortBy::Stock => found.sort_by_key(|p| Reverse(p.stock())),
            SortBy::None => {}
        }
        found
    }

    pub fn categories(&self) -> Vec<Facet> { facets(self.products.iter().map(Product::category)) }

    pub fn suppliers(&self) -> Vec<Facet> { facets(self.products.iter().map(Product::supplier)) }
}

// "all" is what listing clients send for an unfiltered facet.
fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn facets<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Facet> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names.filter(|n| !n.is_empty()) {
        *counts.entry(name).or_default() += 1;
    }
    counts.into_iter().map(|(name, count)| Facet { name: name.to_string(), count }).collect()
}

fn validate_product(product: &Product) -> Result<(), CatalogError> {
    if product.base_price() <= Decimal::ZERO { return Err(CatalogError::InvalidBasePrice(product.id())); }
    if product.max_quantity() == Some(0) { return Err(CatalogError::InvalidMaxQuantity(product.id())); }

    let mut breaks = product.price_breaks().to_vec();
    breaks.sort_by_key(|b| b.min_qty);
    for b in &breaks {
        if b.min_qty == 0 || b.price <= Decimal::ZERO {
            return Err(CatalogError::InvalidPriceBreak { id: product.id(), min_qty: b.min_qty });
        }
    }
    // Pricing still picks the cheapest applicable break for these; flag them for review.
    for pair in breaks.windows(2) {
        if pair[0].min_qty == pair[1].min_qty {
            tracing::warn!(product = product.id(), min_qty = pair[0].min_qty, "duplicate price break threshold");
        } else if pair[1].price > pair[0].price {
            tracing::warn!(product = product.id(), min_qty = pair[1].min_qty, "price break costs more than a lower threshold");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::PriceBreak;
    use crate::domain::value_objects::Sku;

    fn d(v: i64) -> Decimal { Decimal::new(v, 0) }

    fn product(id: u32, sku: &str, name: &str, price: i64, stock: u32, category: &str, supplier: &str) -> Product {
        Product::new(id, Sku::new(sku).unwrap(), name, d(price))
            .with_stock(stock)
            .with_category(category)
            .with_supplier(supplier)
    }

    fn fixture() -> Catalog {
        Catalog::new(vec![
            product(1, "POL-01", "Polo Piqué", 8990, 120, "textil", "Promoimport"),
            product(2, "TAZ-01", "taza cerámica", 3500, 400, "hogar", "Cerámicas Sur"),
            product(3, "MOC-01", "Mochila Urbana", 24990, 35, "bolsos", "Promoimport"),
            product(4, "BOL-02", "Bolsa Ecológica", 1990, 900, "bolsos", "EcoPack"),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_query_sorts_by_name() {
        let catalog = fixture();
        let names: Vec<_> = catalog.search(&ProductQuery::default()).iter().map(|p| p.id()).collect();
        assert_eq!(names, vec![4, 3, 1, 2]);
    }

    #[test]
    fn test_filters_combine() {
        let catalog = fixture();
        let query = ProductQuery { category: Some("bolsos".into()), supplier: Some("Promoimport".into()), ..Default::default() };
        let ids: Vec<_> = catalog.search(&query).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![3]);

        let all = ProductQuery { category: Some("all".into()), supplier: Some("all".into()), ..Default::default() };
        assert_eq!(catalog.search(&all).len(), 4);
    }

    #[test]
    fn test_search_matches_name_or_sku_case_insensitively() {
        let catalog = fixture();
        let by_name = ProductQuery { search: Some("TAZA".into()), ..Default::default() };
        assert_eq!(catalog.search(&by_name)[0].id(), 2);
        let by_sku = ProductQuery { search: Some("moc".into()), ..Default::default() };
        assert_eq!(catalog.search(&by_sku)[0].id(), 3);
    }

    #[test]
    fn test_price_range_and_sorting() {
        let catalog = fixture();
        let query = ProductQuery { min_price: Some(d(3500)), max_price: Some(d(8990)), sort: SortBy::Price, ..Default::default() };
        let ids: Vec<_> = catalog.search(&query).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 2]);

        let by_stock = ProductQuery { sort: SortBy::Stock, ..Default::default() };
        let ids: Vec<_> = catalog.search(&by_stock).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_facets_count_products() {
        let catalog = fixture();
        assert_eq!(catalog.categories(), vec![
            Facet { name: "bolsos".into(), count: 2 },
            Facet { name: "hogar".into(), count: 1 },
            Facet { name: "textil".into(), count: 1 },
        ]);
        assert_eq!(catalog.suppliers().iter().find(|f| f.name == "Promoimport").unwrap().count, 2);
    }

    #[test]
    fn test_rejects_invalid_products() {
        assert!(matches!(
            Catalog::new(vec![product(1, "A", "A", 0, 1, "x", "y")]),
            Err(CatalogError::InvalidBasePrice(1))
        ));
        let bad_break = product(2, "B", "B", 100, 1, "x", "y").with_price_breaks(vec![PriceBreak::new(0, d(90))]);
        assert!(matches!(Catalog::new(vec![bad_break]), Err(CatalogError::InvalidPriceBreak { id: 2, min_qty: 0 })));
        assert!(matches!(
            Catalog::new(vec![product(1, "A", "A", 10, 1, "x", "y"), product(1, "B", "B", 10, 1, "x", "y")]),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_accepts_duplicate_thresholds() {
        let odd = product(5, "ODD", "Odd", 1000, 10, "x", "y")
            .with_price_breaks(vec![PriceBreak::new(10, d(900)), PriceBreak::new(10, d(850))]);
        let catalog = Catalog::new(vec![odd]).unwrap();
        assert_eq!(catalog.find(5).unwrap().price_for(10).unwrap().unit_price, d(850));
    }

    #[test]
    fn test_accepts_non_monotonic_breaks() {
        let odd = product(6, "ODD-2", "Odd", 1000, 100, "x", "y")
            .with_price_breaks(vec![PriceBreak::new(10, d(900)), PriceBreak::new(50, d(950))]);
        let catalog = Catalog::new(vec![odd]).unwrap();
        let price = catalog.find(6).unwrap().price_for(60).unwrap();
        assert_eq!(price.unit_price, d(900));
        assert_eq!(price.discount_percent, 10);
    }

    #[test]
    fn test_rejects_zero_max_quantity() {
        let capped = product(7, "CAP", "Capped", 1000, 10, "x", "y").with_max_quantity(0);
        assert!(matches!(Catalog::new(vec![capped]), Err(CatalogError::InvalidMaxQuantity(7))));

        let json = r#"[{"id": 8, "sku": "CAP-2", "name": "Capped", "category": "x", "supplier": "y", "basePrice": 1000, "stock": 10, "maxQuantity": 0}]"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::InvalidMaxQuantity(8))));
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.products().iter().all(|p| p.volume_tiers().is_ok()));
    }
}
