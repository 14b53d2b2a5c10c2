//! Configuration management for the procurement graph pipeline

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::index::KeyOrder;

/// Source column names for the four record fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub vendor_key: String,
    pub product_key: String,
    pub purchase_count: String,
    pub amount: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            vendor_key: "vendor_key".to_string(),
            product_key: "product_key".to_string(),
            purchase_count: "purchase_count".to_string(),
            amount: "amount".to_string(),
        }
    }
}

/// Default configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum purchase count for a record to be kept
    pub min_purchases: i64,

    /// Column names in the input dataset
    pub columns: ColumnNames,

    /// How distinct keys are ordered before ids are assigned
    pub key_order: KeyOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_purchases: 20,
            columns: ColumnNames::default(),
            key_order: KeyOrder::Auto,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Configuration for a run against `output_dir`: the explicit file if given,
    /// else the `config.json` an earlier run saved there, else defaults
    pub fn resolve(explicit: Option<&Path>, output_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_json_file(path);
        }

        let saved = output_dir.join("config.json");
        if saved.exists() {
            log::info!("Using saved configuration {}", saved.display());
            return Self::from_json_file(&saved);
        }

        Ok(Self::default())
    }

    /// Write the effective configuration next to the pipeline outputs
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join("config.json");
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"min_purchases": 5, "columns": {"vendor_key": "duns"}}"#)
                .unwrap();
        assert_eq!(config.min_purchases, 5);
        assert_eq!(config.columns.vendor_key, "duns");
        assert_eq!(config.columns.product_key, "product_key");
        assert_eq!(config.key_order, KeyOrder::Auto);
    }

    #[test]
    fn resolve_prefers_explicit_then_saved() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::resolve(None, dir.path()).unwrap(), Config::default());

        let saved = Config {
            min_purchases: 7,
            ..Config::default()
        };
        saved.save(dir.path()).unwrap();
        assert_eq!(Config::resolve(None, dir.path()).unwrap(), saved);

        let explicit = dir.path().join("other.json");
        fs::write(&explicit, r#"{"min_purchases": 3}"#).unwrap();
        assert_eq!(
            Config::resolve(Some(&explicit), dir.path())
                .unwrap()
                .min_purchases,
            3
        );
    }

    #[test]
    fn default_threshold_is_twenty() {
        assert_eq!(Config::default().min_purchases, 20);
    }
}
