//! HTTP API

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{delete, get, post}, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::catalog::{Catalog, Facet, ProductQuery};
use crate::config::Config;
use crate::domain::aggregates::{Cart, CartError, CartSummary, Product, ProductId, Quote, QuoteRequest};
use crate::domain::pricing::{PriceResult, PricingError, VolumeTier};
use crate::domain::value_objects::Money;
use crate::{CatalogServiceError, Result};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// Carts by session id, capped at `Config::max_cart_sessions`. Sessions
    /// leave the map only when cleared.
    pub carts: Arc<RwLock<HashMap<String, Cart>>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(catalog: Catalog, config: Config) -> Self {
        Self { catalog: Arc::new(catalog), carts: Arc::default(), config: Arc::new(config) }
    }

    fn product(&self, id: ProductId) -> Result<&Product> {
        self.catalog.find(id).ok_or(CatalogServiceError::ProductNotFound(id))
    }

    fn ensure_cart_capacity(&self, carts: &HashMap<String, Cart>, session: &str) -> Result<()> {
        let max = self.config.max_cart_sessions;
        if !carts.contains_key(session) && carts.len() >= max {
            return Err(CatalogServiceError::CartCapacity(max));
        }
        Ok(())
    }
}

type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "swag-catalog"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/price", get(price_preview))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/suppliers", get(list_suppliers))
        .route("/api/v1/cart/:session", get(get_cart).post(add_to_cart).put(update_cart_item).delete(clear_cart))
        .route("/api/v1/cart/:session/items/:product_id", delete(remove_cart_item))
        .route("/api/v1/cart/:session/summary", get(cart_summary))
        .route("/api/v1/quotes", post(create_quote))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

fn reject(err: impl Into<CatalogServiceError>) -> (StatusCode, String) {
    let err = err.into();
    let status = match &err {
        CatalogServiceError::ProductNotFound(_) | CatalogServiceError::Cart(CartError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
        CatalogServiceError::Cart(CartError::NotAvailable(_)) => StatusCode::CONFLICT,
        CatalogServiceError::CartCapacity(_) => StatusCode::SERVICE_UNAVAILABLE,
        CatalogServiceError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.to_string())
}

async fn list_products(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> Json<Vec<Product>> {
    Json(s.catalog.search(&q).into_iter().cloned().collect())
}

#[derive(Debug, Serialize)]
pub struct ProductDetail { #[serde(flatten)] pub product: Product, pub volume_tiers: Vec<VolumeTier> }

async fn get_product(State(s): State<AppState>, Path(id): Path<ProductId>) -> ApiResult<Json<ProductDetail>> {
    let product = s.product(id).map_err(reject)?;
    let volume_tiers = product.volume_tiers().map_err(reject)?;
    Ok(Json(ProductDetail { product: product.clone(), volume_tiers }))
}

#[derive(Debug, Deserialize)] pub struct PriceParams { pub quantity: i64 }

#[derive(Debug, Serialize)]
pub struct PricePreview { pub product_id: ProductId, pub quantity: u32, #[serde(flatten)] pub price: PriceResult, pub total: Money, pub savings: Money }

async fn price_preview(State(s): State<AppState>, Path(id): Path<ProductId>, Query(p): Query<PriceParams>) -> ApiResult<Json<PricePreview>> {
    let product = s.product(id).map_err(reject)?;
    let quantity = match u32::try_from(p.quantity) {
        Ok(quantity) => quantity,
        Err(_) if p.quantity < 1 => return Err(reject(PricingError::InvalidQuantity(p.quantity))),
        Err(_) => return Err(reject(CatalogServiceError::Validation(format!("quantity {} exceeds the maximum of {}", p.quantity, u32::MAX)))),
    };
    let price = product.price_for(quantity).map_err(reject)?;
    let currency = &s.config.currency;
    Ok(Json(PricePreview {
        product_id: id, quantity,
        total: Money::new(price.total(quantity), currency), savings: Money::new(price.savings(quantity), currency),
        price,
    }))
}

async fn list_categories(State(s): State<AppState>) -> Json<Vec<Facet>> { Json(s.catalog.categories()) }
async fn list_suppliers(State(s): State<AppState>) -> Json<Vec<Facet>> { Json(s.catalog.suppliers()) }

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Json<Cart> {
    let carts = s.carts.read().await;
    Json(carts.get(&session).cloned().unwrap_or_else(|| Cart::new(&s.config.currency)))
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest { pub product_id: ProductId, pub quantity: u32, #[serde(default)] pub color: Option<String>, #[serde(default)] pub size: Option<String> }

async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CartItemRequest>) -> ApiResult<(StatusCode, Json<Cart>)> {
    let product = s.product(r.product_id).map_err(reject)?;
    // Unavailable products are left to the cart, which answers with a conflict.
    if product.is_purchasable() { product.validate_quantity(r.quantity).map_err(reject)?; }
    let mut carts = s.carts.write().await;
    s.ensure_cart_capacity(&carts, &session).map_err(reject)?;
    let current = carts.get(&session).cloned().unwrap_or_else(|| Cart::new(&s.config.currency));
    let next = current.with_item(product, r.quantity, r.color.as_deref(), r.size.as_deref()).map_err(reject)?;
    tracing::debug!(%session, product = r.product_id, quantity = r.quantity, "item added to cart");
    carts.insert(session, next.clone());
    Ok((StatusCode::CREATED, Json(next)))
}

async fn update_cart_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CartItemRequest>) -> ApiResult<Json<Cart>> {
    if r.quantity > 0 { s.product(r.product_id).map_err(reject)?.validate_quantity(r.quantity).map_err(reject)?; }
    let mut carts = s.carts.write().await;
    let current = carts.get(&session).ok_or_else(|| reject(CartError::ItemNotFound(r.product_id)))?;
    let next = current.with_quantity(r.product_id, r.color.as_deref(), r.size.as_deref(), r.quantity).map_err(reject)?;
    carts.insert(session, next.clone());
    Ok(Json(next))
}

#[derive(Debug, Deserialize)] pub struct VariantParams { pub color: Option<String>, pub size: Option<String> }

async fn remove_cart_item(State(s): State<AppState>, Path((session, product_id)): Path<(String, ProductId)>, Query(v): Query<VariantParams>) -> ApiResult<Json<Cart>> {
    let mut carts = s.carts.write().await;
    let current = carts.get(&session).ok_or_else(|| reject(CartError::ItemNotFound(product_id)))?;
    let next = current.without_item(product_id, v.color.as_deref(), v.size.as_deref()).map_err(reject)?;
    carts.insert(session, next.clone());
    Ok(Json(next))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    s.carts.write().await.remove(&session);
    StatusCode::NO_CONTENT
}

async fn cart_summary(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CartSummary>> {
    let carts = s.carts.read().await;
    let summary = match carts.get(&session) {
        Some(cart) => cart.summary(),
        None => Cart::new(&s.config.currency).summary(),
    };
    summary.map(Json).map_err(reject)
}

async fn create_quote(State(s): State<AppState>, Json(r): Json<QuoteRequest>) -> ApiResult<(StatusCode, Json<Quote>)> {
    r.validate().map_err(reject)?;
    let product = s.product(r.product_id).map_err(reject)?;
    let quote = Quote::build(product, &r, Utc::now(), s.config.quote_validity_days, &s.config.currency).map_err(reject)?;
    tracing::info!(quote = %quote.number, product = quote.product_id, quantity = quote.quantity, company = %quote.company.company_name, "quote issued");
    Ok((StatusCode::CREATED, Json(quote)))
}
