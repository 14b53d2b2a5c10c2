//! Node indexing and bipartite graph construction

pub mod bipartite;
pub mod edgelist;
pub mod index;

pub use bipartite::BipartiteGraph;
pub use edgelist::{build_edge_list, EdgeList, TypeVector};
pub use index::{KeyIndex, KeyOrder, NodeId, NodeIndex};
