use arrow::record_batch::RecordBatch;
use hashbrown::{HashMap, HashSet};

use crate::error::{GraphError, Result};
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::stats::naive_weighted_choice;
use crate::walks::traits::{walks_to_record_batch, AlgorithmParams, GraphWalk, WalkBase};

/// Second-order (node2vec) random walks.
///
/// With `t` the previous node, a candidate `x` for the next step gets the
/// unnormalised weight `1/p` if `x == t`, `1` if `x` is also a neighbour of
/// `t`, and `1/q` otherwise, multiplied by the edge weight for weighted walks.
#[derive(Debug)]
pub struct BiasedRandomWalk<'g> {
    base: WalkBase<'g>,
}

/// Parameters of a biased walk besides the roots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasedWalkParams {
    pub n: usize,
    pub length: usize,
    /// Return parameter; revisiting the previous node has weight `1/p`.
    pub p: f64,
    /// In-out parameter; moving away from the previous node has weight `1/q`.
    pub q: f64,
    pub weighted: bool,
    pub seed: Option<u64>,
}

impl Default for BiasedWalkParams {
    fn default() -> Self {
        Self {
            n: 1,
            length: 10,
            p: 1.0,
            q: 1.0,
            weighted: false,
            seed: None,
        }
    }
}

impl<'g> BiasedRandomWalk<'g> {
    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("BiasedRandomWalk", graph, schema, seed)?,
        })
    }

    pub fn run<S: AsRef<str>>(&self, nodes: &[S], params: BiasedWalkParams) -> Result<Vec<Vec<String>>> {
        let BiasedWalkParams {
            n,
            length,
            p,
            q,
            weighted,
            seed,
        } = params;

        self.check_weights(p, q)?;
        let Some(roots) = self.base.check_common_parameters(nodes, n, length)? else {
            return Ok(Vec::new());
        };
        if weighted {
            self.check_edge_weights()?;
        }

        let (ip, iq) = (1.0 / p, 1.0 / q);
        let walks = self.base.with_rng(seed, |rng| {
            let mut walks = Vec::with_capacity(roots.len() * n);
            for &root in &roots {
                for _ in 0..n {
                    walks.push(self.walk(rng, root, length, ip, iq, weighted)?);
                }
            }
            Ok::<_, GraphError>(walks)
        })?;

        Ok(walks.iter().map(|w| self.base.ids(w)).collect())
    }

    fn walk(
        &self,
        rng: &mut RandomState,
        root: Iloc,
        length: usize,
        ip: f64,
        iq: f64,
        weighted: bool,
    ) -> Result<Vec<Iloc>> {
        let graph = self.base.graph;
        let mut walk = vec![root];
        if length == 1 {
            return Ok(walk);
        }

        let neighbours = graph.weighted_neighbour_ilocs(root, Direction::Both);
        if neighbours.is_empty() {
            return Ok(walk);
        }

        // no history yet: only the edge weights bias the first step
        let weights: Vec<f64> = neighbours
            .iter()
            .map(|&(_, w)| if weighted { w } else { 1.0 })
            .collect();
        let mut current = neighbours[naive_weighted_choice(rng, &weights)?].0;
        let mut previous = root;
        let mut previous_neighbours: HashSet<Iloc> = neighbours.iter().map(|&(n, _)| n).collect();

        loop {
            walk.push(current);
            if walk.len() >= length {
                break;
            }

            let neighbours = graph.weighted_neighbour_ilocs(current, Direction::Both);
            if neighbours.is_empty() {
                break;
            }

            let weights: Vec<f64> = neighbours
                .iter()
                .map(|&(candidate, edge_weight)| {
                    let weight = if weighted { edge_weight } else { 1.0 };
                    if candidate == previous {
                        ip * weight
                    } else if previous_neighbours.contains(&candidate) {
                        weight
                    } else {
                        iq * weight
                    }
                })
                .collect();

            let choice = naive_weighted_choice(rng, &weights)?;
            previous = current;
            previous_neighbours = neighbours.iter().map(|&(n, _)| n).collect();
            current = neighbours[choice].0;
        }

        Ok(walk)
    }

    fn check_weights(&self, p: f64, q: f64) -> Result<()> {
        if !(p > 0.0) {
            return Err(self.base.error(format!("Parameter p should be greater than 0, found {}.", p)));
        }
        if !(q > 0.0) {
            return Err(self.base.error(format!("Parameter q should be greater than 0, found {}.", q)));
        }
        Ok(())
    }

    /// Every weight must be finite and non-negative, and parallel edges between
    /// the same pair of nodes must agree on their weight.
    fn check_edge_weights(&self) -> Result<()> {
        let graph = self.base.graph;
        let edges = graph.edges();
        let weights = graph.edge_weight_values();

        let invalid: Vec<String> = edges
            .iter()
            .zip(weights)
            .filter(|(_, w)| !(w.is_finite() && **w >= 0.0))
            .map(|((src, tgt), w)| format!("{:?}--{:?} (weight={})", src, tgt, w))
            .collect();
        if !invalid.is_empty() {
            return Err(GraphError::data_integrity(format!(
                "(BiasedRandomWalk) Expected edge weights to be finite and non-negative, found some invalid: {}",
                invalid.join(", ")
            )));
        }

        let mut seen: HashMap<(Iloc, Iloc), f64> = HashMap::new();
        let mut ambiguous: Vec<String> = Vec::new();
        for ((&src, &tgt), &w) in graph.edge_sources().iter().zip(graph.edge_targets()).zip(weights) {
            let key = if graph.is_directed() || src <= tgt { (src, tgt) } else { (tgt, src) };
            match seen.get(&key) {
                Some(&existing) if existing != w => ambiguous.push(format!(
                    "{:?}--{:?} (weights {} and {})",
                    graph.node_id(src),
                    graph.node_id(tgt),
                    existing,
                    w
                )),
                Some(_) => {}
                None => {
                    seen.insert(key, w);
                }
            }
        }
        if !ambiguous.is_empty() {
            return Err(GraphError::data_integrity(format!(
                "(BiasedRandomWalk) Multiple edges with different weights between the same nodes: {}",
                ambiguous.join(", ")
            )));
        }

        Ok(())
    }
}

impl GraphWalk for BiasedRandomWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let nodes: Vec<String> = params
            .optional("nodes")?
            .unwrap_or_else(|| self.base.graph.nodes().to_vec());
        let defaults = BiasedWalkParams::default();
        let walk_params = BiasedWalkParams {
            n: params.optional("n")?.unwrap_or(defaults.n),
            length: params.optional("length")?.unwrap_or(defaults.length),
            p: params.optional("p")?.unwrap_or(defaults.p),
            q: params.optional("q")?.unwrap_or(defaults.q),
            weighted: params.optional("weighted")?.unwrap_or(defaults.weighted),
            seed: params.optional("seed")?,
        };

        let walks = self.run(&nodes, walk_params)?;
        walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "biased_random_walk"
    }

    fn description(&self) -> &'static str {
        "Node2Vec-style second order random walks with return (p) and in-out (q) parameters"
    }
}
