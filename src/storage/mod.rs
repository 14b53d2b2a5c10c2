//! Results persistence module

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use serde_json::to_string_pretty;

use crate::cluster::{ClusterTable, CommunityAssignment};
use crate::error::PipelineError;
use crate::graph::{EdgeList, KeyIndex, TypeVector};

/// Write one `vendor_id<TAB>product_id` line per edge, no header
pub fn write_edgelist(path: &Path, edges: &EdgeList) -> Result<()> {
    log::debug!("Writing {} edges to {}", edges.len(), path.display());

    let mut writer = BufWriter::new(File::create(path)?);
    for &(vendor, product) in &edges.edges {
        writeln!(writer, "{}\t{}", vendor, product)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write one type code per line in NodeId order
pub fn write_types(path: &Path, types: &TypeVector) -> Result<()> {
    log::debug!("Writing {} node types to {}", types.len(), path.display());

    let mut writer = BufWriter::new(File::create(path)?);
    for code in types.iter() {
        writeln!(writer, "{}", code)?;
    }
    writer.flush()?;

    Ok(())
}

/// Read a community assignment: one integer per line, blank lines skipped
pub fn read_assignment(path: &Path) -> Result<CommunityAssignment> {
    let file = File::open(path)
        .with_context(|| format!("opening assignment {}", path.display()))?;

    let mut clusters = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let value = line.trim();
        if value.is_empty() {
            continue;
        }

        let cluster = value
            .parse()
            .map_err(|_| PipelineError::InvalidAssignment {
                line: number + 1,
                value: value.to_string(),
            })?;
        clusters.push(cluster);
    }

    log::info!("Read {} cluster labels from {}", clusters.len(), path.display());

    Ok(CommunityAssignment::new(clusters))
}

/// Write a `node_id,original_key` table for one node class
pub fn write_index_table(path: &Path, index: &KeyIndex) -> Result<()> {
    let (ids, keys): (Vec<u32>, Vec<&str>) = index.iter().unzip();
    let mut df = df!("node_id" => ids, "original_key" => keys)?;
    write_csv(path, &mut df)
}

/// Write an `original_key,cluster_id` table in row order
pub fn write_cluster_table(path: &Path, table: &ClusterTable) -> Result<()> {
    let keys: Vec<&str> = table.rows.iter().map(|r| r.original_key.as_str()).collect();
    let ids: Vec<i64> = table.rows.iter().map(|r| r.cluster_id).collect();
    let mut df = df!("original_key" => keys, "cluster_id" => ids)?;
    write_csv(path, &mut df)
}

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    log::debug!("Writing {} rows to {}", df.height(), path.display());

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;

    Ok(())
}

/// Pretty-print any serializable summary as JSON
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}
