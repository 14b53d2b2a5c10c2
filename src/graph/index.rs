//! Bijective vendor/product node indexing
//!
//! Vendors occupy ids `1..=N_v` and products `N_v+1..=N_v+N_p`, each class
//! numbered in sorted key order so unchanged input always yields the same ids.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::Record;
use crate::error::{NodeClass, PipelineError};

/// Unified 1-based node index handed to the community detector
pub type NodeId = u32;

/// Requested ordering of distinct keys before numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrder {
    /// Numeric when every key of a class parses as a number, else lexical
    Auto,
    /// Always compare the string form byte-wise
    Lexical,
}

/// Ordering that was actually applied to one node class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortRule {
    Integer,
    Float,
    Lexical,
}

/// Sort distinct keys under `order`. Numeric ties fall back to the string form.
fn sort_distinct<'a>(
    keys: impl Iterator<Item = &'a str>,
    order: KeyOrder,
) -> (Vec<String>, SortRule) {
    let distinct: Vec<&str> = keys.unique().collect();

    if order == KeyOrder::Auto {
        let integers: Option<Vec<(i64, &str)>> = distinct
            .iter()
            .map(|key| key.parse::<i64>().ok().map(|value| (value, *key)))
            .collect();
        if let Some(mut keyed) = integers {
            keyed.sort_unstable();
            return (into_keys(keyed), SortRule::Integer);
        }

        let floats: Option<Vec<(f64, &str)>> = distinct
            .iter()
            .map(|key| {
                key.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(|value| (value, *key))
            })
            .collect();
        if let Some(mut keyed) = floats {
            keyed.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            return (into_keys(keyed), SortRule::Float);
        }
    }

    let mut sorted = distinct;
    sorted.sort_unstable();
    (
        sorted.into_iter().map(str::to_string).collect(),
        SortRule::Lexical,
    )
}

fn into_keys<T>(keyed: Vec<(T, &str)>) -> Vec<String> {
    keyed.into_iter().map(|(_, key)| key.to_string()).collect()
}

/// Forward and inverse dictionaries for one node class
#[derive(Debug, Clone)]
pub struct KeyIndex {
    class: NodeClass,
    first_id: NodeId,
    rule: SortRule,

    /// Keys in id order: `keys[i]` has id `first_id + i`
    keys: Vec<String>,

    /// Key to id
    ids: HashMap<String, NodeId>,
}

impl KeyIndex {
    fn new(class: NodeClass, first_id: NodeId, keys: Vec<String>, rule: SortRule) -> Self {
        let ids = keys
            .iter()
            .zip(first_id..)
            .map(|(key, id)| (key.clone(), id))
            .collect();

        Self {
            class,
            first_id,
            rule,
            keys,
            ids,
        }
    }

    pub fn class(&self) -> NodeClass {
        self.class
    }

    pub fn sort_rule(&self) -> SortRule {
        self.rule
    }

    /// Look up the id of a key
    pub fn forward(&self, key: &str) -> Option<NodeId> {
        self.ids.get(key).copied()
    }

    /// Look up the key of an id in this class's range
    pub fn inverse(&self, id: NodeId) -> Option<&str> {
        let offset = id.checked_sub(self.first_id)? as usize;
        self.keys.get(offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first_id(&self) -> NodeId {
        self.first_id
    }

    /// Last id of the range; only meaningful for a non-empty index
    pub fn last_id(&self) -> NodeId {
        self.first_id + self.keys.len() as NodeId - 1
    }

    /// `(id, key)` pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        (self.first_id..).zip(self.keys.iter().map(String::as_str))
    }
}

/// The combined vendor/product id space
#[derive(Debug, Clone)]
pub struct NodeIndex {
    pub vendors: KeyIndex,
    pub products: KeyIndex,
}

impl NodeIndex {
    /// Index the distinct keys of `records` with automatic key ordering
    pub fn build(records: &[Record]) -> Result<Self> {
        Self::build_with_order(records, KeyOrder::Auto)
    }

    pub fn build_with_order(records: &[Record], order: KeyOrder) -> Result<Self> {
        let (vendor_keys, vendor_rule) =
            sort_distinct(records.iter().map(|r| r.vendor_key.as_str()), order);
        if vendor_keys.is_empty() {
            return Err(PipelineError::EmptyInput {
                class: NodeClass::Vendor,
            }
            .into());
        }

        let (product_keys, product_rule) =
            sort_distinct(records.iter().map(|r| r.product_key.as_str()), order);
        if product_keys.is_empty() {
            return Err(PipelineError::EmptyInput {
                class: NodeClass::Product,
            }
            .into());
        }

        let total = vendor_keys.len() + product_keys.len();
        NodeId::try_from(total)
            .with_context(|| format!("{} nodes exceed the node id range", total))?;
        let n_vendors = vendor_keys.len() as NodeId;

        let vendors = KeyIndex::new(NodeClass::Vendor, 1, vendor_keys, vendor_rule);
        let products = KeyIndex::new(
            NodeClass::Product,
            n_vendors + 1,
            product_keys,
            product_rule,
        );

        log::info!(
            "Indexed {} vendors ({:?} order) and {} products ({:?} order)",
            vendors.len(),
            vendor_rule,
            products.len(),
            product_rule
        );

        Ok(Self { vendors, products })
    }

    pub fn n_vendors(&self) -> usize {
        self.vendors.len()
    }

    pub fn n_products(&self) -> usize {
        self.products.len()
    }

    pub fn node_count(&self) -> usize {
        self.vendors.len() + self.products.len()
    }

    /// Class owning `id`, or None outside `1..=node_count`
    pub fn class_of(&self, id: NodeId) -> Option<NodeClass> {
        match id.cmp(&self.products.first_id()) {
            Ordering::Less if id >= 1 => Some(NodeClass::Vendor),
            Ordering::Less => None,
            _ if (id as usize) <= self.node_count() => Some(NodeClass::Product),
            _ => None,
        }
    }

    /// Key for any id in the combined space
    pub fn key_of(&self, id: NodeId) -> Option<&str> {
        match self.class_of(id)? {
            NodeClass::Vendor => self.vendors.inverse(id),
            NodeClass::Product => self.products.inverse(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("V1", "P1", 25, 1.0),
            Record::new("V1", "P2", 30, 2.0),
            Record::new("V2", "P1", 20, 3.0),
        ]
    }

    #[test]
    fn worked_example_ids() {
        let index = NodeIndex::build(&sample()).unwrap();
        assert_eq!(index.vendors.forward("V1"), Some(1));
        assert_eq!(index.vendors.forward("V2"), Some(2));
        assert_eq!(index.products.forward("P1"), Some(3));
        assert_eq!(index.products.forward("P2"), Some(4));
        assert_eq!(index.node_count(), 4);
    }

    #[test]
    fn forward_inverse_bijection_and_partition() {
        let records: Vec<Record> = (0..50)
            .map(|i| Record::new(&format!("v{}", i % 7), &format!("p{}", i % 11), 20, 0.0))
            .collect();
        let index = NodeIndex::build(&records).unwrap();
        let n_v = index.n_vendors() as NodeId;
        let total = index.node_count() as NodeId;

        for (id, key) in index.vendors.iter() {
            assert!((1..=n_v).contains(&id));
            assert_eq!(index.vendors.forward(key), Some(id));
            assert_eq!(index.vendors.inverse(id), Some(key));
            assert_eq!(index.class_of(id), Some(NodeClass::Vendor));
        }
        for (id, key) in index.products.iter() {
            assert!(id > n_v && id <= total);
            assert_eq!(index.products.forward(key), Some(id));
            assert_eq!(index.products.inverse(id), Some(key));
            assert_eq!(index.class_of(id), Some(NodeClass::Product));
        }
        assert_eq!(index.class_of(0), None);
        assert_eq!(index.class_of(total + 1), None);
        assert_eq!(index.vendors.inverse(n_v + 1), None);
        assert_eq!(index.products.inverse(n_v), None);
    }

    #[test]
    fn ids_ignore_row_order() {
        let records = sample();
        let mut reversed = records.clone();
        reversed.reverse();

        let a = NodeIndex::build(&records).unwrap();
        let b = NodeIndex::build(&reversed).unwrap();
        assert_eq!(a.vendors.iter().collect::<Vec<_>>(), b.vendors.iter().collect::<Vec<_>>());
        assert_eq!(a.products.iter().collect::<Vec<_>>(), b.products.iter().collect::<Vec<_>>());
    }

    #[test]
    fn integer_keys_sort_numerically() {
        let records = vec![
            Record::new("10", "B", 20, 0.0),
            Record::new("9", "A", 20, 0.0),
            Record::new("100", "A", 20, 0.0),
        ];
        let index = NodeIndex::build(&records).unwrap();
        assert_eq!(index.vendors.sort_rule(), SortRule::Integer);
        assert_eq!(
            index.vendors.iter().map(|(_, k)| k).collect::<Vec<_>>(),
            vec!["9", "10", "100"]
        );
        assert_eq!(index.products.sort_rule(), SortRule::Lexical);
    }

    #[test]
    fn float_keys_and_ties_are_total() {
        let keys = ["2.5", "10", "2.50", "-1"];
        let (sorted, rule) = sort_distinct(keys.iter().copied(), KeyOrder::Auto);
        assert_eq!(rule, SortRule::Float);
        assert_eq!(sorted, vec!["-1", "2.5", "2.50", "10"]);
    }

    #[test]
    fn mixed_keys_and_forced_lexical() {
        let (sorted, rule) = sort_distinct(["9", "x", "10"].into_iter(), KeyOrder::Auto);
        assert_eq!(rule, SortRule::Lexical);
        assert_eq!(sorted, vec!["10", "9", "x"]);

        let (sorted, rule) = sort_distinct(["9", "10"].into_iter(), KeyOrder::Lexical);
        assert_eq!(rule, SortRule::Lexical);
        assert_eq!(sorted, vec!["10", "9"]);
    }

    #[test]
    fn empty_records_fail() {
        let err = NodeIndex::build(&[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::EmptyInput {
                class: NodeClass::Vendor
            })
        );
    }

    #[test]
    fn single_vendor_single_product() {
        let index = NodeIndex::build(&[Record::new("V", "P", 20, 0.0)]).unwrap();
        assert_eq!(index.vendors.first_id(), 1);
        assert_eq!(index.vendors.last_id(), 1);
        assert_eq!(index.products.first_id(), 2);
        assert_eq!(index.products.last_id(), 2);
        assert_eq!(index.key_of(2), Some("P"));
    }
}
