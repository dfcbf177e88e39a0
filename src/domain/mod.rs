//! Domain model: value objects, volume pricing and aggregates
pub mod aggregates;
pub mod pricing;
pub mod value_objects;
