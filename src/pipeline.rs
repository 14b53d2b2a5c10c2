//! Stage orchestration: filter, index, build edges, attach clusters

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cluster::attach::attach_clusters;
use crate::cluster::metrics::{self, ClusterSummary};
use crate::cluster::{ClusterTable, CommunityAssignment};
use crate::config::Config;
use crate::data::filter::filter_records;
use crate::data::Record;
use crate::graph::bipartite::GraphStats;
use crate::graph::index::SortRule;
use crate::graph::{build_edge_list, BipartiteGraph, EdgeList, NodeIndex, TypeVector};
use crate::storage;

/// Contents of `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareSummary {
    pub records_loaded: usize,
    pub records_kept: usize,
    pub min_purchases: i64,
    pub vendor_order: SortRule,
    pub product_order: SortRule,
    pub graph: GraphStats,
}

/// Everything handed to the community detector, with the index to undo it
#[derive(Debug, Clone)]
pub struct Prepared {
    pub records_loaded: usize,
    pub min_purchases: i64,

    /// Records that passed the threshold, in input order
    pub records: Vec<Record>,

    pub index: NodeIndex,
    pub edges: EdgeList,
    pub types: TypeVector,
    pub graph: BipartiteGraph,
}

impl Prepared {
    pub fn summary(&self) -> PrepareSummary {
        PrepareSummary {
            records_loaded: self.records_loaded,
            records_kept: self.records.len(),
            min_purchases: self.min_purchases,
            vendor_order: self.index.vendors.sort_rule(),
            product_order: self.index.products.sort_rule(),
            graph: self.graph.stats(),
        }
    }

    /// Write the detector inputs, index tables and summary to `output_dir`
    pub fn write(&self, output_dir: &Path) -> Result<()> {
        log::info!("Writing detector inputs to {}", output_dir.display());
        fs::create_dir_all(output_dir)?;

        storage::write_edgelist(&output_dir.join("edgelist"), &self.edges)?;
        storage::write_types(&output_dir.join("types"), &self.types)?;
        storage::write_index_table(&output_dir.join("vendor_index.csv"), &self.index.vendors)?;
        storage::write_index_table(
            &output_dir.join("product_index.csv"),
            &self.index.products,
        )?;
        storage::save_json(&output_dir.join("summary.json"), &self.summary())?;

        Ok(())
    }
}

/// Filter, index and build the edge list; nothing is written
pub fn prepare(records: &[Record], config: &Config) -> Result<Prepared> {
    let kept = filter_records(records, config.min_purchases);
    let index = NodeIndex::build_with_order(&kept, config.key_order)?;
    let (edges, types) = build_edge_list(&kept, &index)?;
    let graph = BipartiteGraph::from_edges(&edges, &types);

    Ok(Prepared {
        records_loaded: records.len(),
        min_purchases: config.min_purchases,
        records: kept,
        index,
        edges,
        types,
        graph,
    })
}

/// Cluster tables for one assignment, with their summary
#[derive(Debug, Clone)]
pub struct Attached {
    pub vendors: ClusterTable,
    pub products: ClusterTable,
    pub summary: ClusterSummary,
}

impl Attached {
    pub fn write(&self, output_dir: &Path) -> Result<()> {
        log::info!("Writing cluster tables to {}", output_dir.display());
        fs::create_dir_all(output_dir)?;

        storage::write_cluster_table(&output_dir.join("vendor_clusters.csv"), &self.vendors)?;
        storage::write_cluster_table(&output_dir.join("product_clusters.csv"), &self.products)?;
        storage::save_json(&output_dir.join("clusters_summary.json"), &self.summary)?;

        Ok(())
    }
}

/// Attach an assignment to the prepared index
pub fn attach(prepared: &Prepared, assignment: &CommunityAssignment) -> Result<Attached> {
    let (vendors, products) = attach_clusters(assignment, &prepared.index)?;
    let summary = metrics::summarize(
        &prepared.records,
        &prepared.edges,
        &prepared.graph,
        assignment,
    )?;

    log::info!(
        "Found {} vendor clusters, {} product clusters, {} occupied blocks",
        summary.vendor_clusters.len(),
        summary.product_clusters.len(),
        summary.blocks.len()
    );

    Ok(Attached {
        vendors,
        products,
        summary,
    })
}
