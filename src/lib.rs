pub mod error;
pub mod graph;
pub mod random;
pub mod stats;
pub mod walks;

pub use error::{GraphError, Result};
pub use graph::{EdgeType, GraphBuilder, GraphConfig, GraphSchema, HeteroGraph};
pub use random::{random_state, set_seed, RandomState};
pub use walks::{
    AlgorithmParams, BiasedRandomWalk, BiasedWalkParams, DirectedBreadthFirstNeighbours, GraphWalk,
    SampledBreadthFirstWalk, SampledHeterogeneousBreadthFirstWalk, TemporalBias, TemporalRandomWalk,
    TemporalWalkParams, UniformRandomMetaPathWalk, UniformRandomWalk,
};

pub mod prelude {
    pub use crate::error::{GraphError, Result};
    pub use crate::graph::{
        read_csv, AdjacencyMatrix, Direction, EdgeType, FeatureMatrix, GraphBuilder, GraphConfig, GraphSchema,
        HeteroGraph, NeighbourWithWeight,
    };
    pub use crate::random::{random_state, set_seed, RandomState};
    pub use crate::walks::{
        AlgorithmParams, BiasedRandomWalk, BiasedWalkParams, DirectedBreadthFirstNeighbours, GraphWalk,
        SampledBreadthFirstWalk, SampledHeterogeneousBreadthFirstWalk, TemporalBias, TemporalRandomWalk,
        TemporalWalkParams, UniformRandomMetaPathWalk, UniformRandomWalk,
    };
}
