//! Edge list and node type vector construction

use anyhow::Result;

use crate::data::Record;
use crate::error::{NodeClass, PipelineError};
use crate::graph::index::{NodeId, NodeIndex};

/// `(vendor_id, product_id)` pairs in filtered-record order, duplicates kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeList {
    pub edges: Vec<(NodeId, NodeId)>,
}

impl EdgeList {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Node type codes in NodeId order: `n_vendors` ones followed by `n_products` twos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeVector {
    n_vendors: usize,
    n_products: usize,
}

impl TypeVector {
    pub fn new(n_vendors: usize, n_products: usize) -> Self {
        Self {
            n_vendors,
            n_products,
        }
    }

    pub fn n_vendors(&self) -> usize {
        self.n_vendors
    }

    pub fn n_products(&self) -> usize {
        self.n_products
    }

    pub fn len(&self) -> usize {
        self.n_vendors + self.n_products
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let vendor = NodeClass::Vendor.type_code();
        let product = NodeClass::Product.type_code();
        std::iter::repeat(vendor)
            .take(self.n_vendors)
            .chain(std::iter::repeat(product).take(self.n_products))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }
}

/// Rewrite records as id pairs through the node index
pub fn build_edge_list(records: &[Record], index: &NodeIndex) -> Result<(EdgeList, TypeVector)> {
    let mut edges = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let vendor_id = index.vendors.forward(&record.vendor_key).ok_or_else(|| {
            PipelineError::UnknownKey {
                class: NodeClass::Vendor,
                key: record.vendor_key.clone(),
                record: row,
            }
        })?;
        let product_id = index.products.forward(&record.product_key).ok_or_else(|| {
            PipelineError::UnknownKey {
                class: NodeClass::Product,
                key: record.product_key.clone(),
                record: row,
            }
        })?;

        edges.push((vendor_id, product_id));
    }

    let types = TypeVector::new(index.n_vendors(), index.n_products());

    log::info!(
        "Built edge list with {} edges over {} nodes",
        edges.len(),
        types.len()
    );

    Ok((EdgeList { edges }, types))
}
