use std::collections::VecDeque;

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::walks::traits::{
    nested_walks_to_record_batch, sample_with_replacement, AlgorithmParams, GraphWalk, WalkBase,
};

/// Breadth-first neighbourhood sampling on directed graphs, drawing
/// in-neighbours and out-neighbours separately.
///
/// Each sample is a binary tree flattened into `2^(hops + 1) - 1` slots. The
/// root lives in slot 0; the in-neighbours sampled from slot `s` go to slot
/// `2s + 1` and the out-neighbours to slot `2s + 2`. A node reached through
/// the directions `d_1 .. d_k` therefore always lands in slot
/// `2^k - 1 + binary(d_1 .. d_k)` (in = 0, out = 1).
#[derive(Debug)]
pub struct DirectedBreadthFirstNeighbours<'g> {
    base: WalkBase<'g>,
}

impl<'g> DirectedBreadthFirstNeighbours<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        let base = WalkBase::new("DirectedBreadthFirstNeighbours", graph, schema, seed)?;
        if !graph.is_directed() {
            return Err(base.error("Graph must be directed"));
        }
        Ok(Self { base })
    }

    pub fn run<S: AsRef<str>>(
        &self,
        nodes: &[S],
        in_size: &[usize],
        out_size: &[usize],
        n: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<Vec<Option<String>>>>> {
        let max_slots = self.check_neighbourhood_sizes(in_size, out_size)?;
        let Some(roots) = self.base.check_common_parameters(nodes, n, in_size.len())? else {
            return Ok(Vec::new());
        };

        let samples = self.base.with_rng(seed, |rng| {
            roots
                .iter()
                .flat_map(|&root| std::iter::repeat(root).take(n))
                .map(|root| self.sample(rng, root, in_size, out_size, max_slots))
                .collect::<Vec<_>>()
        });

        Ok(samples
            .iter()
            .map(|sample| sample.iter().map(|slot| self.base.optional_ids(slot)).collect())
            .collect())
    }

    fn sample(
        &self,
        rng: &mut RandomState,
        root: Iloc,
        in_size: &[usize],
        out_size: &[usize],
        max_slots: usize,
    ) -> Vec<Vec<Option<Iloc>>> {
        let max_hops = in_size.len();
        let mut sample: Vec<Vec<Option<Iloc>>> = vec![Vec::new(); max_slots];

        let mut queue: VecDeque<(Option<Iloc>, usize, usize)> = VecDeque::new();
        queue.push_back((Some(root), 0, 0));

        while let Some((node, depth, slot)) = queue.pop_front() {
            sample[slot].push(node);
            if depth >= max_hops {
                continue;
            }

            let in_slot = 2 * slot + 1;
            let in_nodes = self.sample_neighbours(rng, node, Direction::In, in_size[depth]);
            queue.extend(in_nodes.into_iter().map(|s| (s, depth + 1, in_slot)));

            let out_slot = in_slot + 1;
            let out_nodes = self.sample_neighbours(rng, node, Direction::Out, out_size[depth]);
            queue.extend(out_nodes.into_iter().map(|s| (s, depth + 1, out_slot)));
        }

        sample
    }

    fn sample_neighbours(
        &self,
        rng: &mut RandomState,
        node: Option<Iloc>,
        direction: Direction,
        size: usize,
    ) -> Vec<Option<Iloc>> {
        let neighbours = match node {
            Some(node) => self.base.graph.neighbour_ilocs(node, direction),
            None => Vec::new(),
        };
        sample_with_replacement(rng, &neighbours, size)
    }

    /// Validates the size lists and returns the number of slots per sample.
    fn check_neighbourhood_sizes(&self, in_size: &[usize], out_size: &[usize]) -> Result<usize> {
        self.base.check_sizes("in_size", in_size)?;
        self.base.check_sizes("out_size", out_size)?;
        if in_size.len() != out_size.len() {
            return Err(self
                .base
                .error("The number of hops for the in and out neighbourhoods must be the same."));
        }
        u32::try_from(in_size.len() + 1)
            .ok()
            .and_then(|shift| 1usize.checked_shl(shift))
            .map(|slots| slots - 1)
            .ok_or_else(|| {
                self.base.error(format!(
                    "Too many hops ({}) to lay the sample out as a binary tree.",
                    in_size.len()
                ))
            })
    }
}

impl GraphWalk for DirectedBreadthFirstNeighbours<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let in_size: Vec<usize> = params.require("in_size")?;
        let out_size: Vec<usize> = params.require("out_size")?;
        let n: usize = params.optional("n")?.unwrap_or(1);
        let seed: Option<u64> = params.optional("seed")?;

        let samples = self.run(&nodes, &in_size, &out_size, n, seed)?;
        nested_walks_to_record_batch(&samples)
    }

    fn name(&self) -> &'static str {
        "directed_breadth_first_neighbours"
    }

    fn description(&self) -> &'static str {
        "Breadth-first samples of in- and out-neighbourhoods laid out as a binary tree of slots"
    }
}
