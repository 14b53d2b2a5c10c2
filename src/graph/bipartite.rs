//! Compressed vendor-to-product adjacency for graph statistics

use serde::{Deserialize, Serialize};

use crate::graph::edgelist::{EdgeList, TypeVector};

/// Degree and multiplicity figures written to `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub n_vendors: usize,
    pub n_products: usize,
    pub edge_count: usize,
    pub distinct_pairs: usize,
    pub max_multiplicity: usize,
    pub avg_vendor_degree: f64,
    pub avg_product_degree: f64,
}

/// Compressed sparse rows over vendors; columns are 0-based product positions
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    pub n_vendors: usize,
    pub n_products: usize,

    /// offsets[v] to offsets[v+1] is the product range of vendor position v
    pub offsets: Vec<u32>,

    /// Concatenated, per-vendor sorted product positions; multi-edges repeat
    pub products: Vec<u32>,
}

impl BipartiteGraph {
    /// Build from an edge list whose ids follow the `types` layout
    pub fn from_edges(edges: &EdgeList, types: &TypeVector) -> Self {
        let n_vendors = types.n_vendors();
        let n_products = types.n_products();
        let product_base = n_vendors as u32 + 1;

        let mut degrees = vec![0u32; n_vendors];
        for &(vendor, _) in &edges.edges {
            degrees[(vendor - 1) as usize] += 1;
        }

        let mut offsets = Vec::with_capacity(n_vendors + 1);
        offsets.push(0);
        let mut offset = 0;
        for &degree in &degrees {
            offset += degree;
            offsets.push(offset);
        }

        let mut cursor = vec![0usize; n_vendors];
        let mut products = vec![0u32; edges.len()];
        for &(vendor, product) in &edges.edges {
            let v = (vendor - 1) as usize;
            products[offsets[v] as usize + cursor[v]] = product - product_base;
            cursor[v] += 1;
        }

        let mut graph = Self {
            n_vendors,
            n_products,
            offsets,
            products,
        };
        graph.sort_adjacency_lists();
        graph
    }

    fn sort_adjacency_lists(&mut self) {
        for vendor in 0..self.n_vendors {
            let start = self.offsets[vendor] as usize;
            let end = self.offsets[vendor + 1] as usize;
            self.products[start..end].sort_unstable();
        }
    }

    /// Product positions adjacent to a vendor position, with repeats
    pub fn neighbors(&self, vendor: usize) -> &[u32] {
        let start = self.offsets[vendor] as usize;
        let end = self.offsets[vendor + 1] as usize;
        &self.products[start..end]
    }

    pub fn edge_count(&self) -> usize {
        self.products.len()
    }

    pub fn vendor_degree(&self, vendor: usize) -> usize {
        self.neighbors(vendor).len()
    }

    pub fn product_degrees(&self) -> Vec<u32> {
        let mut degrees = vec![0u32; self.n_products];
        for &product in &self.products {
            degrees[product as usize] += 1;
        }
        degrees
    }

    /// Distinct product positions of a vendor, each with its multiplicity
    pub fn grouped_neighbors(&self, vendor: usize) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.neighbors(vendor)
            .chunk_by(|a, b| a == b)
            .map(|run| (run[0], run.len()))
    }

    pub fn stats(&self) -> GraphStats {
        let mut distinct_pairs = 0;
        let mut max_multiplicity = 0;
        for vendor in 0..self.n_vendors {
            for (_, multiplicity) in self.grouped_neighbors(vendor) {
                distinct_pairs += 1;
                max_multiplicity = max_multiplicity.max(multiplicity);
            }
        }

        let edges = self.edge_count() as f64;
        GraphStats {
            n_vendors: self.n_vendors,
            n_products: self.n_products,
            edge_count: self.edge_count(),
            distinct_pairs,
            max_multiplicity,
            avg_vendor_degree: edges / self.n_vendors.max(1) as f64,
            avg_product_degree: edges / self.n_products.max(1) as f64,
        }
    }
}
