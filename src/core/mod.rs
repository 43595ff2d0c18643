// src/core/mod.rs

pub mod normalize;
pub mod sanitize;

pub use normalize::{absolute_url, parse_amount_eur, parse_decision_date};
