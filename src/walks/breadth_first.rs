use std::collections::VecDeque;

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::walks::traits::{
    nested_walks_to_record_batch, padded_walks_to_record_batch, sample_with_replacement, AlgorithmParams,
    GraphWalk, WalkBase,
};

/// Bounded breadth-first neighbourhood sampling with a fixed fan-out.
///
/// At depth `d` every visited node contributes exactly `n_size[d]`
/// neighbours, drawn with replacement. Nodes without neighbours (and padding
/// slots below them) contribute `None`, so every sample of a given `n_size`
/// has the same length: `1 + n_size[0] + n_size[0] * n_size[1] + ...`.
#[derive(Debug)]
pub struct SampledBreadthFirstWalk<'g> {
    base: WalkBase<'g>,
}

impl<'g> SampledBreadthFirstWalk<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("SampledBreadthFirstWalk", graph, schema, seed)?,
        })
    }

    /// `n` samples per root, each a flat list in level order.
    pub fn run<S: AsRef<str>>(
        &self,
        nodes: &[S],
        n_size: &[usize],
        n: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<Option<String>>>> {
        self.base.check_sizes("n_size", n_size)?;
        let Some(roots) = self.base.check_common_parameters(nodes, n, n_size.len())? else {
            return Ok(Vec::new());
        };

        let walks = self.base.with_rng(seed, |rng| {
            roots
                .iter()
                .flat_map(|&root| std::iter::repeat(root).take(n))
                .map(|root| self.walk(rng, root, n_size))
                .collect::<Vec<_>>()
        });

        Ok(walks.iter().map(|w| self.base.optional_ids(w)).collect())
    }

    fn walk(&self, rng: &mut RandomState, root: Iloc, n_size: &[usize]) -> Vec<Option<Iloc>> {
        let max_hops = n_size.len();
        let mut walk = Vec::new();
        let mut queue: VecDeque<(Option<Iloc>, usize)> = VecDeque::new();
        queue.push_back((Some(root), 0));

        while let Some((node, depth)) = queue.pop_front() {
            walk.push(node);
            if depth >= max_hops {
                continue;
            }

            let neighbours = match node {
                Some(node) => self.base.graph.neighbour_ilocs(node, Direction::Both),
                None => Vec::new(),
            };
            let samples = sample_with_replacement(rng, &neighbours, n_size[depth]);
            queue.extend(samples.into_iter().map(|s| (s, depth + 1)));
        }

        walk
    }
}

impl GraphWalk for SampledBreadthFirstWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let n_size: Vec<usize> = params.require("n_size")?;
        let n: usize = params.optional("n")?.unwrap_or(1);
        let seed: Option<u64> = params.optional("seed")?;

        let walks = self.run(&nodes, &n_size, n, seed)?;
        padded_walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "breadth_first_walk"
    }

    fn description(&self) -> &'static str {
        "Fixed fan-out breadth-first neighbourhood samples for homogeneous graphs"
    }
}

/// Breadth-first neighbourhood sampling for heterogeneous graphs.
///
/// Every visited node fans out once per edge type its node type has in the
/// schema, drawing `n_size[depth]` neighbours through that edge type. Each
/// fan-out is one inner list of the sample, so the nesting is
/// `[[root], [samples of edge type 1], [samples of edge type 2], ...]` in
/// breadth-first order. Missing neighbours are padded with `None`.
#[derive(Debug)]
pub struct SampledHeterogeneousBreadthFirstWalk<'g> {
    base: WalkBase<'g>,
}

impl<'g> SampledHeterogeneousBreadthFirstWalk<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("SampledHeterogeneousBreadthFirstWalk", graph, schema, seed)?,
        })
    }

    pub fn run<S: AsRef<str>>(
        &self,
        nodes: &[S],
        n_size: &[usize],
        n: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<Vec<Option<String>>>>> {
        self.base.check_sizes("n_size", n_size)?;
        let Some(roots) = self.base.check_common_parameters(nodes, n, n_size.len())? else {
            return Ok(Vec::new());
        };

        let walks = self.base.with_rng(seed, |rng| {
            roots
                .iter()
                .flat_map(|&root| std::iter::repeat(root).take(n))
                .map(|root| self.walk(rng, root, n_size))
                .collect::<Vec<_>>()
        });

        Ok(walks
            .iter()
            .map(|walk| walk.iter().map(|level| self.base.optional_ids(level)).collect())
            .collect())
    }

    fn walk(&self, rng: &mut RandomState, root: Iloc, n_size: &[usize]) -> Vec<Vec<Option<Iloc>>> {
        let graph = self.base.graph;
        let schema = &self.base.schema;
        let adjacency = graph.adjacency_types();
        let max_hops = n_size.len();

        let mut walk = vec![vec![Some(root)]];
        let mut queue: VecDeque<(Option<Iloc>, &str, usize)> = VecDeque::new();
        queue.push_back((Some(root), graph.node_type_name(root), 0));

        while let Some((node, node_type, depth)) = queue.pop_front() {
            if depth >= max_hops {
                continue;
            }

            for edge_type in schema.edge_types_for(node_type) {
                let neighbours = match node {
                    Some(node) => adjacency.neighbours(edge_type, node),
                    None => &[],
                };
                let samples = sample_with_replacement(rng, neighbours, n_size[depth]);
                queue.extend(samples.iter().map(|&s| (s, edge_type.n2.as_str(), depth + 1)));
                walk.push(samples);
            }
        }

        walk
    }
}

impl GraphWalk for SampledHeterogeneousBreadthFirstWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let n_size: Vec<usize> = params.require("n_size")?;
        let n: usize = params.optional("n")?.unwrap_or(1);
        let seed: Option<u64> = params.optional("seed")?;

        let walks = self.run(&nodes, &n_size, n, seed)?;
        nested_walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "heterogeneous_breadth_first_walk"
    }

    fn description(&self) -> &'static str {
        "Fixed fan-out breadth-first neighbourhood samples, one fan-out per edge type"
    }
}
