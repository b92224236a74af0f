use std::sync::Arc;

use arrow::array::{StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{GraphSchema, HeteroGraph, Iloc};
use crate::random::{random_state, RandomState};

/// Loosely typed sampler parameters, e.g. parsed from JSON on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParams {
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl AlgorithmParams {
    pub fn new() -> Self {
        Self {
            params: serde_json::Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params = serde_json::from_str(json)?;
        Ok(Self { params })
    }

    pub fn with_param<T: Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        self.params.insert(key.to_string(), value);
        Ok(self)
    }

    /// `Ok(None)` when `key` is absent or null; a value of the wrong shape is
    /// an error naming the key rather than a silent fallback to the default.
    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.params.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                GraphError::invalid_parameter(format!("malformed parameter '{}' = {}: {}", key, value, e))
            }),
        }
    }

    /// Like [`AlgorithmParams::optional`] but a missing key is an error.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.optional(key)?
            .ok_or_else(|| GraphError::invalid_parameter(format!("missing parameter '{}'", key)))
    }
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Common interface of the samplers for table-oriented callers.
pub trait GraphWalk {
    /// Run the sampler with loosely typed parameters and return the walks as
    /// a table (see [`walks_to_record_batch`]).
    fn execute(&self, params: &AlgorithmParams) -> Result<RecordBatch>;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "Graph walk"
    }
}

/// State shared by every sampler: the graph, its schema, and the persistent
/// random generator used when a call does not supply its own seed.
#[derive(Debug)]
pub struct WalkBase<'g> {
    pub(crate) graph: &'g HeteroGraph,
    pub(crate) schema: GraphSchema,
    rng: Mutex<RandomState>,
    name: &'static str,
}

impl<'g> WalkBase<'g> {
    pub(crate) fn new(
        name: &'static str,
        graph: &'g HeteroGraph,
        schema: Option<GraphSchema>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let schema = match schema {
            Some(schema) => schema,
            None => graph.create_graph_schema::<&str>(None)?,
        };
        Ok(WalkBase {
            graph,
            schema,
            rng: Mutex::new(random_state(seed)),
            name,
        })
    }

    pub fn graph(&self) -> &'g HeteroGraph {
        self.graph
    }

    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// Run `f` with a call-scoped generator when `seed` is given, otherwise
    /// with the sampler's persistent one.
    pub(crate) fn with_rng<T>(&self, seed: Option<u64>, f: impl FnOnce(&mut RandomState) -> T) -> T {
        match seed {
            Some(s) => f(&mut random_state(Some(s))),
            None => f(&mut *self.rng.lock()),
        }
    }

    pub(crate) fn error(&self, msg: impl AsRef<str>) -> GraphError {
        GraphError::invalid_parameter(format!("({}) {}", self.name, msg.as_ref()))
    }

    /// Resolve root nodes. `None` means there are no roots, which is not an
    /// error: callers return an empty result.
    pub(crate) fn check_nodes<S: AsRef<str>>(&self, nodes: &[S]) -> Result<Option<Vec<Iloc>>> {
        if nodes.is_empty() {
            log::warn!(
                "({}) No root node IDs given. An empty list will be returned as a result.",
                self.name
            );
            return Ok(None);
        }
        self.graph.node_ilocs(nodes).map(Some)
    }

    pub(crate) fn check_repetitions(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(self.error(format!(
                "The number of walks per root node, n, should be a positive integer, found {}.",
                n
            )));
        }
        Ok(())
    }

    pub(crate) fn check_length(&self, length: usize) -> Result<()> {
        if length == 0 {
            return Err(self.error(format!(
                "The walk length, length, should be a positive integer, found {}.",
                length
            )));
        }
        Ok(())
    }

    pub(crate) fn check_sizes(&self, name: &str, sizes: &[usize]) -> Result<()> {
        if sizes.is_empty() {
            return Err(self.error(format!("The neighbourhood size list, {}, should not be empty.", name)));
        }
        Ok(())
    }

    /// Guard clauses shared by the walk samplers; `Ok(None)` for empty roots.
    pub(crate) fn check_common_parameters<S: AsRef<str>>(
        &self,
        nodes: &[S],
        n: usize,
        length: usize,
    ) -> Result<Option<Vec<Iloc>>> {
        self.check_repetitions(n)?;
        self.check_length(length)?;
        self.check_nodes(nodes)
    }

    pub(crate) fn ids(&self, walk: &[Iloc]) -> Vec<String> {
        walk.iter().map(|&n| self.graph.node_id(n).to_string()).collect()
    }

    pub(crate) fn optional_ids(&self, walk: &[Option<Iloc>]) -> Vec<Option<String>> {
        walk.iter()
            .map(|n| n.map(|n| self.graph.node_id(n).to_string()))
            .collect()
    }
}

/// Draw `k` items uniformly with replacement; padding (`None`) when `items`
/// is empty.
pub(crate) fn sample_with_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    items: &[Iloc],
    k: usize,
) -> Vec<Option<Iloc>> {
    if items.is_empty() {
        return vec![None; k];
    }
    (0..k).map(|_| items.choose(rng).copied()).collect()
}

fn walk_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("walk_id", DataType::UInt32, false),
        Field::new("group", DataType::UInt32, false),
        Field::new("position", DataType::UInt32, false),
        Field::new("node_id", DataType::Utf8, true),
    ]))
}

#[derive(Default)]
struct WalkColumns {
    walk_ids: Vec<u32>,
    groups: Vec<u32>,
    positions: Vec<u32>,
    node_ids: Vec<Option<String>>,
}

impl WalkColumns {
    fn push(&mut self, walk: usize, group: usize, position: usize, node: Option<String>) {
        self.walk_ids.push(walk as u32);
        self.groups.push(group as u32);
        self.positions.push(position as u32);
        self.node_ids.push(node);
    }

    fn finish(self) -> Result<RecordBatch> {
        RecordBatch::try_new(
            walk_schema(),
            vec![
                Arc::new(UInt32Array::from(self.walk_ids)),
                Arc::new(UInt32Array::from(self.groups)),
                Arc::new(UInt32Array::from(self.positions)),
                Arc::new(StringArray::from(self.node_ids)),
            ],
        )
        .map_err(GraphError::from)
    }
}

/// Flat walks as a table; `group` is always 0.
pub fn walks_to_record_batch(walks: &[Vec<String>]) -> Result<RecordBatch> {
    let mut columns = WalkColumns::default();
    for (walk_id, walk) in walks.iter().enumerate() {
        for (step, node) in walk.iter().enumerate() {
            columns.push(walk_id, 0, step, Some(node.clone()));
        }
    }
    columns.finish()
}

/// Flat walks that may contain padding slots; padding becomes a null `node_id`.
pub fn padded_walks_to_record_batch(walks: &[Vec<Option<String>>]) -> Result<RecordBatch> {
    let mut columns = WalkColumns::default();
    for (walk_id, walk) in walks.iter().enumerate() {
        for (step, node) in walk.iter().enumerate() {
            columns.push(walk_id, 0, step, node.clone());
        }
    }
    columns.finish()
}

/// Nested samples (per level, edge type, or slot) as a table; `group` is the
/// index of the inner list.
pub fn nested_walks_to_record_batch(samples: &[Vec<Vec<Option<String>>>]) -> Result<RecordBatch> {
    let mut columns = WalkColumns::default();
    for (walk_id, sample) in samples.iter().enumerate() {
        for (group, nodes) in sample.iter().enumerate() {
            for (position, node) in nodes.iter().enumerate() {
                columns.push(walk_id, group, position, node.clone());
            }
        }
    }
    columns.finish()
}
