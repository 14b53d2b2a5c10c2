//! Mapping detector output back to vendor and product keys

use anyhow::Result;

use crate::cluster::{ClusterId, ClusterRow, ClusterTable, CommunityAssignment};
use crate::error::PipelineError;
use crate::graph::index::KeyIndex;
use crate::graph::NodeIndex;

/// Split `assignment` at the vendor/product boundary and relabel through the
/// inverse dictionaries
pub fn attach_clusters(
    assignment: &CommunityAssignment,
    index: &NodeIndex,
) -> Result<(ClusterTable, ClusterTable)> {
    let expected = index.node_count();
    if assignment.len() != expected {
        return Err(PipelineError::LengthMismatch {
            expected,
            actual: assignment.len(),
        }
        .into());
    }

    let (vendor_part, product_part) = assignment.clusters.split_at(index.n_vendors());
    let vendors = label_class(&index.vendors, vendor_part);
    let products = label_class(&index.products, product_part);

    log::info!(
        "Attached clusters to {} vendors and {} products",
        vendors.rows.len(),
        products.rows.len()
    );

    Ok((vendors, products))
}

fn label_class(keys: &KeyIndex, clusters: &[ClusterId]) -> ClusterTable {
    let rows = keys
        .iter()
        .zip(clusters)
        .map(|((_, key), &cluster_id)| ClusterRow {
            original_key: key.to_string(),
            cluster_id,
        })
        .collect();

    ClusterTable {
        class: keys.class(),
        rows,
    }
}
