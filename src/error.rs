//! Error taxonomy for the indexing pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two node classes of the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    Vendor,
    Product,
}

impl NodeClass {
    /// Value written to the `types` file for this class
    pub fn type_code(self) -> u8 {
        match self {
            NodeClass::Vendor => 1,
            NodeClass::Product => 2,
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeClass::Vendor => f.write_str("vendor"),
            NodeClass::Product => f.write_str("product"),
        }
    }
}

/// Fatal conditions raised while building or consuming the node index.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("no distinct {class} keys remain after filtering")]
    EmptyInput { class: NodeClass },
    #[error("record {record} references {class} key '{key}' missing from the node index")]
    UnknownKey {
        class: NodeClass,
        key: String,
        record: usize,
    },
    #[error("community assignment has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("column '{column}' is null at row {row}")]
    MissingValue { column: String, row: usize },
    #[error("assignment line {line} is not an integer: '{value}'")]
    InvalidAssignment { line: usize, value: String },
}
