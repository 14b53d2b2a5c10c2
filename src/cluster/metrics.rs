//! Cluster statistics and block metrics

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, CommunityAssignment};
use crate::data::Record;
use crate::error::PipelineError;
use crate::graph::{BipartiteGraph, EdgeList};

/// Number of nodes carrying one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSize {
    pub cluster_id: ClusterId,
    pub size: usize,
}

/// Traffic between one vendor cluster and one product cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStats {
    pub vendor_cluster: ClusterId,
    pub product_cluster: ClusterId,

    /// Edges counted with multiplicity
    pub edges: usize,

    pub distinct_pairs: usize,
    pub purchase_count: i64,
    pub amount: f64,

    /// Distinct pairs over all possible vendor/product pairs of the block
    pub density: f64,
}

/// Cluster sizes per class plus the block table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub vendor_clusters: Vec<ClusterSize>,
    pub product_clusters: Vec<ClusterSize>,
    pub blocks: Vec<BlockStats>,
}

/// Count nodes per label, ordered by label
pub fn cluster_sizes(labels: &[ClusterId]) -> Vec<ClusterSize> {
    let mut sizes: BTreeMap<ClusterId, usize> = BTreeMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0) += 1;
    }
    sizes
        .into_iter()
        .map(|(cluster_id, size)| ClusterSize { cluster_id, size })
        .collect()
}

fn block_entry(
    blocks: &mut BTreeMap<(ClusterId, ClusterId), BlockStats>,
    vendor_cluster: ClusterId,
    product_cluster: ClusterId,
) -> &mut BlockStats {
    blocks
        .entry((vendor_cluster, product_cluster))
        .or_insert_with(|| BlockStats {
            vendor_cluster,
            product_cluster,
            edges: 0,
            distinct_pairs: 0,
            purchase_count: 0,
            amount: 0.0,
            density: 0.0,
        })
}

/// Summarize an assignment over the records and edges it was fitted on.
///
/// `records` and `edges` must be parallel, as produced by `build_edge_list`.
pub fn summarize(
    records: &[Record],
    edges: &EdgeList,
    graph: &BipartiteGraph,
    assignment: &CommunityAssignment,
) -> Result<ClusterSummary> {
    let expected = graph.n_vendors + graph.n_products;
    if assignment.len() != expected {
        return Err(PipelineError::LengthMismatch {
            expected,
            actual: assignment.len(),
        }
        .into());
    }

    let labels = &assignment.clusters;
    let (vendor_labels, product_labels) = labels.split_at(graph.n_vendors);
    let label_of = |id: u32| labels[(id - 1) as usize];

    let mut blocks: BTreeMap<(ClusterId, ClusterId), BlockStats> = BTreeMap::new();

    for (record, &(vendor, product)) in records.iter().zip(&edges.edges) {
        let stats = block_entry(&mut blocks, label_of(vendor), label_of(product));
        stats.edges += 1;
        stats.purchase_count += record.purchase_count;
        stats.amount += record.amount;
    }

    for vendor in 0..graph.n_vendors {
        for (product, _) in graph.grouped_neighbors(vendor) {
            let stats = block_entry(
                &mut blocks,
                vendor_labels[vendor],
                product_labels[product as usize],
            );
            stats.distinct_pairs += 1;
        }
    }

    let vendor_clusters = cluster_sizes(vendor_labels);
    let product_clusters = cluster_sizes(product_labels);
    let size_of = |sizes: &[ClusterSize], label: ClusterId| {
        sizes
            .iter()
            .find(|s| s.cluster_id == label)
            .map_or(0, |s| s.size)
    };

    let blocks = blocks
        .into_values()
        .map(|mut stats| {
            let possible = size_of(&vendor_clusters, stats.vendor_cluster)
                * size_of(&product_clusters, stats.product_cluster);
            stats.density = stats.distinct_pairs as f64 / possible.max(1) as f64;
            stats
        })
        .collect();

    Ok(ClusterSummary {
        vendor_clusters,
        product_clusters,
        blocks,
    })
}
