use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::element_data::{EdgeData, FeatureTable, NodeData};
use crate::graph::hetero_graph::HeteroGraph;

/// Construction options: directedness, default type names, and the column
/// names read from node and edge tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub directed: bool,
    pub node_type_default: String,
    pub edge_type_default: String,
    pub id_column: String,
    pub source_column: String,
    pub target_column: String,
    pub weight_column: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            directed: false,
            node_type_default: "default".to_string(),
            edge_type_default: "default".to_string(),
            id_column: "id".to_string(),
            source_column: "source".to_string(),
            target_column: "target".to_string(),
            weight_column: "weight".to_string(),
        }
    }
}

/// Collects per-type node and edge tables and builds a [`HeteroGraph`].
///
/// Node tables hold an ID column plus numeric feature columns. Edge tables
/// hold source, target and an optional weight column. When no node tables are
/// given, nodes are inferred from the edge endpoints.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
    nodes: IndexMap<String, Vec<RecordBatch>>,
    edges: IndexMap<String, Vec<RecordBatch>>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.config.directed = directed;
        self
    }

    pub fn add_nodes<S: Into<String>>(mut self, node_type: S, batch: RecordBatch) -> Self {
        self.nodes.entry(node_type.into()).or_default().push(batch);
        self
    }

    /// Node table of the default node type.
    pub fn add_default_nodes(self, batch: RecordBatch) -> Self {
        let node_type = self.config.node_type_default.clone();
        self.add_nodes(node_type, batch)
    }

    pub fn add_edges<S: Into<String>>(mut self, edge_type: S, batch: RecordBatch) -> Self {
        self.edges.entry(edge_type.into()).or_default().push(batch);
        self
    }

    /// Edge table of the default edge type.
    pub fn add_default_edges(self, batch: RecordBatch) -> Self {
        let edge_type = self.config.edge_type_default.clone();
        self.add_edges(edge_type, batch)
    }

    pub fn build(self) -> Result<HeteroGraph> {
        let mut edge_tables = Vec::new();
        for (edge_type, batches) in &self.edges {
            for batch in batches {
                edge_tables.push((edge_type.as_str(), self.read_edges(batch)?));
            }
        }

        let mut nodes = NodeData::default();
        if self.nodes.is_empty() {
            let inferred: IndexSet<&str> = edge_tables
                .iter()
                .flat_map(|(_, table)| table.sources.iter().chain(&table.targets))
                .map(String::as_str)
                .collect();
            let ids: Vec<String> = inferred.into_iter().map(str::to_string).collect();
            nodes.push_type(&self.config.node_type_default, ids, FeatureTable::default());
        } else {
            let mut duplicates = Vec::new();
            for (node_type, batches) in &self.nodes {
                let (ids, features) = self.read_nodes(node_type, batches)?;
                duplicates.extend(nodes.push_type(node_type, ids, features));
            }
            if !duplicates.is_empty() {
                return Err(GraphError::graph_construction(format!(
                    "node IDs must be unique across all types, found duplicates: {:?}",
                    duplicates
                )));
            }
        }

        let mut edges = EdgeData::default();
        let mut missing: IndexSet<String> = IndexSet::new();
        for (edge_type, table) in &edge_tables {
            let type_iloc = edges.types.insert(edge_type.to_string());
            for i in 0..table.sources.len() {
                let src = nodes.ids.get(table.sources[i].as_str());
                let tgt = nodes.ids.get(table.targets[i].as_str());
                match (src, tgt) {
                    (Some(s), Some(t)) => edges.push(s, t, type_iloc, table.weights[i]),
                    _ => {
                        if src.is_none() {
                            missing.insert(table.sources[i].clone());
                        }
                        if tgt.is_none() {
                            missing.insert(table.targets[i].clone());
                        }
                    }
                }
            }
        }
        if !missing.is_empty() {
            return Err(GraphError::missing_nodes(missing));
        }

        edges.index(nodes.len());
        log::debug!(
            "Built {} graph with {} nodes ({} types) and {} edges ({} types)",
            if self.config.directed { "directed" } else { "undirected" },
            nodes.len(),
            nodes.types.len(),
            edges.len(),
            edges.types.len()
        );

        Ok(HeteroGraph::from_parts(self.config.directed, nodes, edges))
    }

    fn read_nodes(&self, node_type: &str, batches: &[RecordBatch]) -> Result<(Vec<String>, FeatureTable)> {
        let mut ids = Vec::new();
        let mut features = FeatureTable::default();

        for (b, batch) in batches.iter().enumerate() {
            let id_idx = column_index(batch, &self.config.id_column, 0)?;
            ids.extend(string_values(batch.column(id_idx), &self.config.id_column)?);

            let feature_columns: Vec<Float32Array> = (0..batch.num_columns())
                .filter(|&c| c != id_idx)
                .map(|c| float32_values(batch.column(c)))
                .collect::<Result<_>>()?;

            if b == 0 {
                features.width = feature_columns.len();
            } else if features.width != feature_columns.len() {
                return Err(GraphError::graph_construction(format!(
                    "all nodes of type '{}' must have the same number of features, found {} and {}",
                    node_type,
                    features.width,
                    feature_columns.len()
                )));
            }

            for row in 0..batch.num_rows() {
                for column in &feature_columns {
                    features.values.push(if column.is_null(row) { 0.0 } else { column.value(row) });
                }
            }
        }

        Ok((ids, features))
    }

    fn read_edges(&self, batch: &RecordBatch) -> Result<EdgeTable> {
        let src_idx = column_index(batch, &self.config.source_column, 0)?;
        let tgt_idx = column_index(batch, &self.config.target_column, 1)?;
        let sources = string_values(batch.column(src_idx), &self.config.source_column)?;
        let targets = string_values(batch.column(tgt_idx), &self.config.target_column)?;

        let weights = match batch.schema().index_of(&self.config.weight_column) {
            Ok(w_idx) => {
                let column = cast(batch.column(w_idx), &DataType::Float64)?;
                let values = column
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| GraphError::graph_construction("weight column must be numeric"))?;
                (0..values.len())
                    .map(|i| if values.is_null(i) { 1.0 } else { values.value(i) })
                    .collect()
            }
            Err(_) => vec![1.0; batch.num_rows()],
        };

        Ok(EdgeTable {
            sources,
            targets,
            weights,
        })
    }
}

struct EdgeTable {
    sources: Vec<String>,
    targets: Vec<String>,
    weights: Vec<f64>,
}

// Column by name, falling back to a fixed position for unnamed tables.
fn column_index(batch: &RecordBatch, name: &str, fallback: usize) -> Result<usize> {
    match batch.schema().index_of(name) {
        Ok(idx) => Ok(idx),
        Err(_) if fallback < batch.num_columns() => Ok(fallback),
        Err(_) => Err(GraphError::graph_construction(format!(
            "table has no '{}' column and fewer than {} columns",
            name,
            fallback + 1
        ))),
    }
}

fn string_values(column: &ArrayRef, name: &str) -> Result<Vec<String>> {
    let column = cast(column, &DataType::Utf8)?;
    let strings = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| GraphError::graph_construction(format!("column '{}' is not castable to text", name)))?;

    if strings.null_count() > 0 {
        return Err(GraphError::graph_construction(format!(
            "column '{}' contains {} null IDs",
            name,
            strings.null_count()
        )));
    }

    Ok(strings.iter().flatten().map(str::to_string).collect())
}

fn float32_values(column: &ArrayRef) -> Result<Float32Array> {
    let column = cast(column, &DataType::Float32)?;
    column
        .as_any()
        .downcast_ref::<Float32Array>()
        .cloned()
        .ok_or_else(|| GraphError::graph_construction("feature columns must be numeric"))
}

impl HeteroGraph {
    pub fn builder(config: GraphConfig) -> GraphBuilder {
        GraphBuilder::new(config)
    }

    /// Undirected graph with one node type and one edge type.
    pub fn new(nodes: RecordBatch, edges: RecordBatch) -> Result<Self> {
        GraphBuilder::default()
            .add_default_nodes(nodes)
            .add_default_edges(edges)
            .build()
    }

    /// Undirected graph whose nodes are inferred from the edge endpoints.
    pub fn from_edges(edges: RecordBatch) -> Result<Self> {
        GraphBuilder::default().add_default_edges(edges).build()
    }

    /// Directed counterpart of [`HeteroGraph::from_edges`].
    pub fn directed_from_edges(edges: RecordBatch) -> Result<Self> {
        GraphBuilder::default().directed(true).add_default_edges(edges).build()
    }
}
