//! Random walks and neighbourhood samplers over a [`HeteroGraph`](crate::graph::HeteroGraph).
//!
//! Every sampler borrows the graph, owns a schema and a persistent random
//! generator, and exposes a typed `run` method plus the table-oriented
//! [`GraphWalk`] interface.

pub mod biased;
pub mod breadth_first;
pub mod directed;
pub mod metapath;
pub mod temporal;
pub mod traits;
pub mod uniform;

mod tests;

pub use biased::{BiasedRandomWalk, BiasedWalkParams};
pub use breadth_first::{SampledBreadthFirstWalk, SampledHeterogeneousBreadthFirstWalk};
pub use directed::DirectedBreadthFirstNeighbours;
pub use metapath::UniformRandomMetaPathWalk;
pub use temporal::{TemporalBias, TemporalRandomWalk, TemporalWalkParams};
pub use traits::{
    nested_walks_to_record_batch, padded_walks_to_record_batch, walks_to_record_batch, AlgorithmParams,
    GraphWalk, WalkBase,
};
pub use uniform::UniformRandomWalk;
