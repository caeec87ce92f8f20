//! Core domain types and logic.

pub mod basket;
pub mod price_table;
pub mod value_series;
pub mod basket_engine;
pub mod rollover;
pub mod metrics;
pub mod benchmark;
pub mod cache;
pub mod poll;
pub mod price_store;
pub mod analysis;
pub mod settings;
pub mod error;
