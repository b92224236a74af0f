use arrow::record_batch::RecordBatch;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::walks::traits::{walks_to_record_batch, AlgorithmParams, GraphWalk, WalkBase};

/// Uniform random walks on heterogeneous graphs that follow metapaths.
///
/// A metapath such as `["author", "paper", "author"]` is repeated cyclically
/// (without its first type) so that step `d` of a walk must land on a node of
/// the `d`-th type. A walk stops early when no neighbour has the required type.
#[derive(Debug)]
pub struct UniformRandomMetaPathWalk<'g> {
    base: WalkBase<'g>,
}

impl<'g> UniformRandomMetaPathWalk<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("UniformRandomMetaPathWalk", graph, schema, seed)?,
        })
    }

    /// For every root, `n` walks per metapath whose first type matches the
    /// root's type.
    pub fn run<S: AsRef<str>>(
        &self,
        nodes: &[S],
        n: usize,
        length: usize,
        metapaths: &[Vec<String>],
        seed: Option<u64>,
    ) -> Result<Vec<Vec<String>>> {
        self.check_metapath_values(metapaths)?;
        let Some(roots) = self.base.check_common_parameters(nodes, n, length)? else {
            return Ok(Vec::new());
        };

        let graph = self.base.graph;
        let walks = self.base.with_rng(seed, |rng| {
            let mut walks = Vec::new();
            for &root in &roots {
                let label = graph.node_type_name(root);
                for metapath in metapaths.iter().filter(|mp| mp[0] == label) {
                    let step_types = self.step_types(metapath, length);
                    for _ in 0..n {
                        walks.push(self.walk(rng, root, length, &step_types));
                    }
                }
            }
            walks
        });

        Ok(walks.iter().map(|w| self.base.ids(w)).collect())
    }

    // Node type required at each step after the root, as type ilocs. Types
    // unknown to the graph can never be matched.
    fn step_types(&self, metapath: &[String], length: usize) -> Vec<Option<Iloc>> {
        let cycle = &metapath[1..];
        cycle
            .iter()
            .cycle()
            .take(length.saturating_sub(1))
            .map(|t| self.base.graph.node_type_iloc_of(t))
            .collect()
    }

    fn walk(&self, rng: &mut RandomState, root: Iloc, length: usize, step_types: &[Option<Iloc>]) -> Vec<Iloc> {
        let graph = self.base.graph;
        let mut walk = Vec::with_capacity(length);
        let mut current = root;
        walk.push(current);

        for required in step_types {
            let candidates: Vec<Iloc> = graph
                .neighbour_ilocs(current, Direction::Both)
                .into_iter()
                .filter(|&nb| Some(graph.node_type_iloc(nb)) == *required)
                .collect();
            let Some(&next) = candidates.choose(rng) else {
                break;
            };
            current = next;
            walk.push(current);
        }

        walk
    }

    fn check_metapath_values(&self, metapaths: &[Vec<String>]) -> Result<()> {
        for metapath in metapaths {
            if metapath.len() < 2 {
                return Err(self.base.error(format!(
                    "Each metapath must specify at least two node types, found {:?}.",
                    metapath
                )));
            }
            if metapath.first() != metapath.last() {
                return Err(self.base.error(format!(
                    "The first and last node type in a metapath should be the same, found {:?}.",
                    metapath
                )));
            }
        }
        Ok(())
    }
}

impl GraphWalk for UniformRandomMetaPathWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let n: usize = params.optional("n")?.unwrap_or(1);
        let length: usize = params.optional("length")?.unwrap_or(10);
        let metapaths: Vec<Vec<String>> = params.require("metapaths")?;
        let seed: Option<u64> = params.optional("seed")?;

        let walks = self.run(&nodes, n, length, &metapaths, seed)?;
        walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "metapath_walk"
    }

    fn description(&self) -> &'static str {
        "Uniform random walks constrained by cyclic metapath schemas"
    }
}
