//! Runtime configuration from the environment (and `.env` via dotenvy).

use std::path::PathBuf;

use anyhow::Context;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Catalog file to load; the bundled catalog when unset.
    pub catalog_path: Option<PathBuf>,
    pub currency: String,
    pub quote_validity_days: i64,
    /// Carts held in memory at once; new sessions are refused beyond this.
    pub max_cart_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { port: 8083, catalog_path: None, currency: "CLP".to_string(), quote_validity_days: 30, max_cart_sessions: 10_000 }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(v) => v.parse().with_context(|| format!("PORT is not a valid port: {v}"))?,
            None => defaults.port,
        };
        let quote_validity_days = match lookup("QUOTE_VALIDITY_DAYS") {
            Some(v) => v.parse().with_context(|| format!("QUOTE_VALIDITY_DAYS is not a number: {v}"))?,
            None => defaults.quote_validity_days,
        };
        anyhow::ensure!(quote_validity_days > 0, "QUOTE_VALIDITY_DAYS must be positive");
        let max_cart_sessions = match lookup("MAX_CART_SESSIONS") {
            Some(v) => v.parse().with_context(|| format!("MAX_CART_SESSIONS is not a number: {v}"))?,
            None => defaults.max_cart_sessions,
        };
        anyhow::ensure!(max_cart_sessions > 0, "MAX_CART_SESSIONS must be positive");

        Ok(Self {
            port,
            catalog_path: lookup("CATALOG_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            currency: lookup("CURRENCY").unwrap_or(defaults.currency).to_uppercase(),
            quote_validity_days,
            max_cart_sessions,
        })
    }
}
