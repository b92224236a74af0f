pub mod adjacency;
pub mod builder;
pub mod element_data;
pub mod hetero_graph;
pub mod id_index;
pub mod loader;
pub mod schema;

pub use adjacency::{AdjacencyMatrix, AdjacencyTypes};
pub use builder::{GraphBuilder, GraphConfig};
pub use hetero_graph::{Direction, FeatureMatrix, HeteroGraph, NeighbourWithWeight};
pub use id_index::{ExternalIdIndex, Iloc, INVALID_ILOC};
pub use loader::read_csv;
pub use schema::{EdgeType, GraphSchema, TypeAdjacency};
