use arrow::record_batch::RecordBatch;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::walks::traits::{walks_to_record_batch, AlgorithmParams, GraphWalk, WalkBase};

/// Uniform random walks: every step moves to a neighbour chosen uniformly at
/// random. A walk that reaches a node without neighbours stops early.
#[derive(Debug)]
pub struct UniformRandomWalk<'g> {
    base: WalkBase<'g>,
}

impl<'g> UniformRandomWalk<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("UniformRandomWalk", graph, schema, seed)?,
        })
    }

    /// `n` walks of at most `length` nodes from each root, grouped by root.
    pub fn run<S: AsRef<str>>(
        &self,
        nodes: &[S],
        n: usize,
        length: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<String>>> {
        let Some(roots) = self.base.check_common_parameters(nodes, n, length)? else {
            return Ok(Vec::new());
        };

        let walks = self.base.with_rng(seed, |rng| {
            roots
                .iter()
                .flat_map(|&root| std::iter::repeat(root).take(n))
                .map(|root| self.walk(rng, root, length))
                .collect::<Vec<_>>()
        });

        Ok(walks.iter().map(|w| self.base.ids(w)).collect())
    }

    fn walk(&self, rng: &mut RandomState, start: Iloc, length: usize) -> Vec<Iloc> {
        let mut walk = Vec::with_capacity(length);
        let mut current = start;
        walk.push(current);

        for _ in 1..length {
            let neighbours = self.base.graph.neighbour_ilocs(current, Direction::Both);
            // dead end
            let Some(&next) = neighbours.choose(rng) else {
                break;
            };
            current = next;
            walk.push(current);
        }

        walk
    }
}

impl GraphWalk for UniformRandomWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let n: usize = params.optional("n")?.unwrap_or(1);
        let length: usize = params.optional("length")?.unwrap_or(10);
        let seed: Option<u64> = params.optional("seed")?;

        let walks = self.run(&nodes, n, length, seed)?;
        walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "uniform_random_walk"
    }

    fn description(&self) -> &'static str {
        "Uniform random walks of bounded length from each root node"
    }
}
