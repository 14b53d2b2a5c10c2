//! Parquet and CSV loading of procurement records

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use polars::prelude::*;

use crate::config::ColumnNames;
use crate::data::Record;
use crate::error::PipelineError;

/// Load every record from a Parquet or CSV file, chosen by extension
pub fn load_records(path: &Path, columns: &ColumnNames) -> Result<Vec<Record>> {
    log::info!("Reading records from {}", path.display());

    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let frame = match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())?,
        Some("csv") => {
            // Keys stay text so zero-padded identifiers survive
            let mut keys = Schema::with_capacity(2);
            keys.with_column(columns.vendor_key.as_str().into(), DataType::String);
            keys.with_column(columns.product_key.as_str().into(), DataType::String);

            LazyCsvReader::new(path)
                .with_has_header(true)
                .with_dtype_overwrite(Some(Arc::new(keys)))
                .finish()?
        }
        other => {
            return Err(anyhow!(
                "Unsupported input format {:?} for {}",
                other,
                path.display()
            ))
        }
    };

    // Keys are cast to strings whatever their source dtype
    let df = frame
        .select([
            col(columns.vendor_key.as_str())
                .cast(DataType::String)
                .alias("vendor_key"),
            col(columns.product_key.as_str())
                .cast(DataType::String)
                .alias("product_key"),
            col(columns.purchase_count.as_str())
                .cast(DataType::Int64)
                .alias("purchase_count"),
            col(columns.amount.as_str())
                .cast(DataType::Float64)
                .alias("amount"),
        ])
        .collect()?;

    log::debug!("Input schema: {:?}", df.schema());
    log::info!("Loaded {} records", df.height());

    let vendors = df.column("vendor_key")?.str()?;
    let products = df.column("product_key")?.str()?;
    let counts = df.column("purchase_count")?.i64()?;
    let amounts = df.column("amount")?.f64()?;

    let missing = |column: &str, row: usize| PipelineError::MissingValue {
        column: column.to_string(),
        row,
    };

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let vendor_key = vendors
            .get(row)
            .ok_or_else(|| missing(&columns.vendor_key, row))?;
        let product_key = products
            .get(row)
            .ok_or_else(|| missing(&columns.product_key, row))?;
        let purchase_count = counts
            .get(row)
            .ok_or_else(|| missing(&columns.purchase_count, row))?;
        let amount = amounts
            .get(row)
            .ok_or_else(|| missing(&columns.amount, row))?;

        records.push(Record::new(vendor_key, product_key, purchase_count, amount));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn csv_with_renamed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        fs::write(
            &path,
            "duns,psc,n,dollars\n100,R425,25,1000.5\n42,AD12,3,7.25\n",
        )
        .unwrap();

        let columns = ColumnNames {
            vendor_key: "duns".to_string(),
            product_key: "psc".to_string(),
            purchase_count: "n".to_string(),
            amount: "dollars".to_string(),
        };
        let records = load_records(&path, &columns).unwrap();

        assert_eq!(
            records,
            vec![
                Record::new("100", "R425", 25, 1000.5),
                Record::new("42", "AD12", 3, 7.25),
            ]
        );
    }

    #[test]
    fn zero_padded_keys_are_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        fs::write(
            &path,
            "vendor_key,product_key,purchase_count,amount\n007,0101,25,1.0\n7,101,30,2.0\n0042,0101,20,3.0\n",
        )
        .unwrap();

        let records = load_records(&path, &ColumnNames::default()).unwrap();
        let vendors: Vec<&str> = records.iter().map(|r| r.vendor_key.as_str()).collect();
        let products: Vec<&str> = records.iter().map(|r| r.product_key.as_str()).collect();
        assert_eq!(vendors, vec!["007", "7", "0042"]);
        assert_eq!(products, vec!["0101", "101", "0101"]);
    }

    #[test]
    fn null_key_is_reported_with_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        fs::write(
            &path,
            "vendor_key,product_key,purchase_count,amount\nV1,P1,25,1.0\nV2,,30,2.0\n",
        )
        .unwrap();

        let err = load_records(&path, &ColumnNames::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::MissingValue {
                column: "product_key".to_string(),
                row: 1,
            })
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.txt");
        fs::write(&path, "x").unwrap();
        assert!(load_records(&path, &ColumnNames::default()).is_err());
    }
}
