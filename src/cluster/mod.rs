//! Community assignments and their attachment to original keys

pub mod attach;
pub mod detector;
pub mod metrics;

use serde::{Deserialize, Serialize};

use crate::error::NodeClass;

/// Community label produced by the external detector
pub type ClusterId = i64;

/// One cluster id per NodeId; position `i` holds the label of NodeId `i + 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityAssignment {
    pub clusters: Vec<ClusterId>,
}

impl CommunityAssignment {
    pub fn new(clusters: Vec<ClusterId>) -> Self {
        Self { clusters }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// A node's original key with its community label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub original_key: String,
    pub cluster_id: ClusterId,
}

/// Cluster labels for one node class, in ascending NodeId order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTable {
    pub class: NodeClass,
    pub rows: Vec<ClusterRow>,
}

impl ClusterTable {
    /// Cluster label of a key, by linear scan
    pub fn cluster_of(&self, key: &str) -> Option<ClusterId> {
        self.rows
            .iter()
            .find(|row| row.original_key == key)
            .map(|row| row.cluster_id)
    }
}
