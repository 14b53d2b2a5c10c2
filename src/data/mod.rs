//! Procurement record loading and filtering

pub mod filter;
pub mod loader;

use serde::{Deserialize, Serialize};

/// One raw contracting row: a vendor buying into a product/service category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub vendor_key: String,
    pub product_key: String,
    pub purchase_count: i64,
    pub amount: f64,
}

impl Record {
    pub fn new(vendor_key: &str, product_key: &str, purchase_count: i64, amount: f64) -> Self {
        Self {
            vendor_key: vendor_key.to_string(),
            product_key: product_key.to_string(),
            purchase_count,
            amount,
        }
    }
}
