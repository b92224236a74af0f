use arrow::record_batch::RecordBatch;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{Direction, GraphSchema, HeteroGraph, Iloc};
use crate::random::RandomState;
use crate::stats::{beta_ppf, naive_weighted_choice, softmax};
use crate::walks::traits::{walks_to_record_batch, AlgorithmParams, GraphWalk, WalkBase};

/// Kernel used to turn edge times into sampling weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalBias {
    /// Softmax over time offsets.
    Exponential,
}

impl TemporalBias {
    fn weights(self, offsets: &[f64]) -> Vec<f64> {
        match self {
            TemporalBias::Exponential => softmax(offsets),
        }
    }
}

/// Arguments of [`TemporalRandomWalk::run`]. `None` fields fall back to the
/// values the walker was constructed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalWalkParams {
    /// Number of context windows to produce.
    pub num_cw: usize,
    /// Size of each context window.
    pub cw_size: usize,
    pub max_walk_length: Option<usize>,
    pub initial_edge_bias: Option<TemporalBias>,
    pub walk_bias: Option<TemporalBias>,
    pub p_walk_success_threshold: Option<f64>,
    pub seed: Option<u64>,
}

impl TemporalWalkParams {
    pub fn new(num_cw: usize, cw_size: usize) -> Self {
        Self {
            num_cw,
            cw_size,
            max_walk_length: None,
            initial_edge_bias: None,
            walk_bias: None,
            p_walk_success_threshold: None,
            seed: None,
        }
    }
}

/// Time-respecting random walks.
///
/// Edge weights are read as timestamps. A walk starts on a random edge and
/// only continues through edges strictly later than the one it arrived by.
/// Walks are collected until they hold `num_cw` context windows of size
/// `cw_size` in total. Walks too short to hold one window are discarded; if
/// discards make success look implausible the walk gives up with
/// [`GraphError::NonConvergence`] instead of looping forever.
#[derive(Debug)]
pub struct TemporalRandomWalk<'g> {
    base: WalkBase<'g>,
    max_walk_length: usize,
    initial_edge_bias: Option<TemporalBias>,
    walk_bias: Option<TemporalBias>,
    p_walk_success_threshold: f64,
}

impl<'g> TemporalRandomWalk<'g> {
    pub const DEFAULT_MAX_WALK_LENGTH: usize = 80;
    pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 0.01;

    // quantile of the success posterior compared against the threshold
    const POSTERIOR_QUANTILE: f64 = 0.95;

    pub fn new(graph: &'g HeteroGraph, schema: Option<GraphSchema>, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            base: WalkBase::new("TemporalRandomWalk", graph, schema, seed)?,
            max_walk_length: Self::DEFAULT_MAX_WALK_LENGTH,
            initial_edge_bias: None,
            walk_bias: None,
            p_walk_success_threshold: Self::DEFAULT_SUCCESS_THRESHOLD,
        })
    }

    pub fn with_max_walk_length(mut self, max_walk_length: usize) -> Self {
        self.max_walk_length = max_walk_length;
        self
    }

    pub fn with_initial_edge_bias(mut self, bias: Option<TemporalBias>) -> Self {
        self.initial_edge_bias = bias;
        self
    }

    pub fn with_walk_bias(mut self, bias: Option<TemporalBias>) -> Self {
        self.walk_bias = bias;
        self
    }

    pub fn with_success_threshold(mut self, threshold: f64) -> Self {
        self.p_walk_success_threshold = threshold;
        self
    }

    pub fn run(&self, params: TemporalWalkParams) -> Result<Vec<Vec<String>>> {
        let TemporalWalkParams {
            num_cw,
            cw_size,
            max_walk_length,
            initial_edge_bias,
            walk_bias,
            p_walk_success_threshold,
            seed,
        } = params;
        let max_walk_length = max_walk_length.unwrap_or(self.max_walk_length);
        let initial_edge_bias = initial_edge_bias.or(self.initial_edge_bias);
        let walk_bias = walk_bias.or(self.walk_bias);
        let threshold = p_walk_success_threshold.unwrap_or(self.p_walk_success_threshold);

        self.check_parameters(num_cw, cw_size, max_walk_length, threshold)?;

        let graph = self.base.graph;
        let sources = graph.edge_sources();
        let targets = graph.edge_targets();
        let times = graph.edge_weight_values();

        let initial_weights = initial_edge_bias.map(|bias| {
            let t_min = times.iter().copied().fold(f64::INFINITY, f64::min);
            let offsets: Vec<f64> = times.iter().map(|t| t - t_min).collect();
            bias.weights(&offsets)
        });

        let walks = self.base.with_rng(seed, |rng| {
            let mut walks = Vec::new();
            let mut produced = 0;
            let (mut successes, mut failures) = (0, 0);

            while produced < num_cw {
                let first = Self::choose(rng, times.len(), initial_weights.as_deref())?;
                let remaining = num_cw - produced + cw_size - 1;
                let walk = self.walk(
                    rng,
                    (sources[first], targets[first]),
                    times[first],
                    max_walk_length.min(remaining),
                    walk_bias,
                )?;

                if walk.len() >= cw_size {
                    produced += walk.len() - cw_size + 1;
                    successes += 1;
                    walks.push(walk);
                } else {
                    failures += 1;
                    self.check_walk_success_probability(successes, failures, cw_size, threshold)?;
                }
            }

            log::debug!(
                "(TemporalRandomWalk) {} walks kept, {} discarded, {} context windows",
                successes,
                failures,
                produced
            );
            Ok::<_, GraphError>(walks)
        })?;

        Ok(walks.iter().map(|w| self.base.ids(w)).collect())
    }

    fn walk(
        &self,
        rng: &mut RandomState,
        (src, dst): (Iloc, Iloc),
        time: f64,
        length: usize,
        bias: Option<TemporalBias>,
    ) -> Result<Vec<Iloc>> {
        let mut walk = vec![src, dst];
        let (mut node, mut time) = (dst, time);

        for _ in 2..length {
            match self.step(rng, node, time, bias)? {
                Some((next, next_time)) => {
                    walk.push(next);
                    node = next;
                    time = next_time;
                }
                None => break,
            }
        }

        Ok(walk)
    }

    // Next (node, time) through an edge strictly later than `time`.
    fn step(
        &self,
        rng: &mut RandomState,
        node: Iloc,
        time: f64,
        bias: Option<TemporalBias>,
    ) -> Result<Option<(Iloc, f64)>> {
        let candidates: Vec<(Iloc, f64)> = self
            .base
            .graph
            .weighted_neighbour_ilocs(node, Direction::Both)
            .into_iter()
            .filter(|&(_, t)| t > time)
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let weights = bias.map(|bias| {
            let offsets: Vec<f64> = candidates.iter().map(|&(_, t)| time - t).collect();
            bias.weights(&offsets)
        });
        let choice = Self::choose(rng, candidates.len(), weights.as_deref())?;
        Ok(Some(candidates[choice]))
    }

    fn choose(rng: &mut RandomState, len: usize, weights: Option<&[f64]>) -> Result<usize> {
        match weights {
            Some(weights) => naive_weighted_choice(rng, weights),
            None => Ok(rng.gen_range(0..len)),
        }
    }

    fn check_walk_success_probability(
        &self,
        successes: usize,
        failures: usize,
        cw_size: usize,
        threshold: f64,
    ) -> Result<()> {
        let posterior = beta_ppf(
            Self::POSTERIOR_QUANTILE,
            1.0 + successes as f64,
            1.0 + failures as f64,
        );
        if posterior < threshold {
            return Err(GraphError::NonConvergence {
                successes,
                failures,
                message: format!(
                    "(TemporalRandomWalk) Discarded {} walks out of {}. Too many temporal walks are being \
                     discarded for being too short. It seems unlikely to be possible to generate a walk of \
                     length {} with this graph",
                    failures,
                    successes + failures,
                    cw_size
                ),
            });
        }
        Ok(())
    }

    fn check_parameters(&self, num_cw: usize, cw_size: usize, max_walk_length: usize, threshold: f64) -> Result<()> {
        if num_cw == 0 {
            return Err(self.base.error(format!(
                "The number of context windows, num_cw, should be a positive integer, found {}.",
                num_cw
            )));
        }
        if cw_size < 2 {
            return Err(self.base.error(format!(
                "The context window size, cw_size, should be at least 2, found {}.",
                cw_size
            )));
        }
        if max_walk_length < cw_size {
            return Err(self.base.error(format!(
                "The maximum walk length, max_walk_length, should be at least cw_size ({}), found {}.",
                cw_size, max_walk_length
            )));
        }
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(self.base.error(format!(
                "The walk success threshold, p_walk_success_threshold, should be in (0, 1), found {}.",
                threshold
            )));
        }
        if self.base.graph.number_of_edges() == 0 {
            return Err(self.base.error("The graph has no edges to start temporal walks from."));
        }
        Ok(())
    }
}

impl GraphWalk for TemporalRandomWalk<'_> {
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch> {
        let walk_params = TemporalWalkParams {
            num_cw: params.require("num_cw")?,
            cw_size: params.require("cw_size")?,
            max_walk_length: params.optional("max_walk_length")?,
            initial_edge_bias: params.optional("initial_edge_bias")?,
            walk_bias: params.optional("walk_bias")?,
            p_walk_success_threshold: params.optional("p_walk_success_threshold")?,
            seed: params.optional("seed")?,
        };

        let walks = self.run(walk_params)?;
        walks_to_record_batch(&walks)
    }

    fn name(&self) -> &'static str {
        "temporal_random_walk"
    }

    fn description(&self) -> &'static str {
        "Time-respecting random walks collected into a target number of context windows"
    }
}
