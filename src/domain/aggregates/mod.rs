//! Aggregates module
pub mod product;
pub mod cart;
pub mod quote;

pub use product::{Product, ProductError, ProductId, ProductStatus};
pub use cart::{Cart, CartError, CartItem, CartLine, CartSummary};
pub use quote::{CompanyData, Quote, QuoteError, QuoteRequest};
