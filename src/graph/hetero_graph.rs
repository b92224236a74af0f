use std::sync::OnceLock;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::error::{GraphError, Result};
use crate::graph::adjacency::{AdjacencyMatrix, AdjacencyTypes};
use crate::graph::element_data::{EdgeData, NodeData};
use crate::graph::id_index::{ExternalIdIndex, Iloc, INVALID_ILOC};
use crate::graph::schema::{EdgeType, GraphSchema};

/// Which incident edges a neighbourhood query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Both,
    In,
    Out,
}

/// A neighbour together with the weight of the edge that reaches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighbourWithWeight<'a> {
    pub node: &'a str,
    pub weight: f64,
}

/// Dense row-major feature matrix returned by [`HeteroGraph::node_features`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }
}

/// Immutable, typed multigraph with per-type node features.
///
/// Undirected graphs store every edge once and answer neighbourhood queries
/// from both endpoints. Directed graphs additionally distinguish in- and
/// out-neighbours.
#[derive(Debug, Clone)]
pub struct HeteroGraph {
    is_directed: bool,
    nodes: NodeData,
    edges: EdgeData,
    adjacency_types: OnceLock<AdjacencyTypes>,
}

impl HeteroGraph {
    pub(crate) fn from_parts(is_directed: bool, nodes: NodeData, edges: EdgeData) -> Self {
        HeteroGraph {
            is_directed,
            nodes,
            edges,
            adjacency_types: OnceLock::new(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// All node IDs, in iloc order.
    pub fn nodes(&self) -> &[String] {
        self.nodes.ids.ids()
    }

    pub fn has_node(&self, node: &str) -> bool {
        self.nodes.ids.contains(node)
    }

    /// All edges as (source, target) pairs, in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.edges
            .sources
            .iter()
            .zip(&self.edges.targets)
            .map(|(&s, &t)| (self.node_id(s), self.node_id(t)))
            .collect()
    }

    /// All edges as (source, target, edge type) triples.
    pub fn edges_with_types(&self) -> Vec<(&str, &str, &str)> {
        (0..self.edges.len())
            .map(|e| {
                (
                    self.node_id(self.edges.sources[e]),
                    self.node_id(self.edges.targets[e]),
                    self.edge_type_name(e),
                )
            })
            .collect()
    }

    /// Edge weights, aligned with [`HeteroGraph::edges`].
    pub fn edge_weight_values(&self) -> &[f64] {
        &self.edges.weights
    }

    // ------------------------------------------------------------------
    // iloc-level access used by the samplers

    pub(crate) fn node_id(&self, node: Iloc) -> &str {
        self.nodes.ids.ids()[node].as_str()
    }

    pub(crate) fn node_iloc(&self, node: &str) -> Option<Iloc> {
        self.nodes.ids.get(node)
    }

    /// Resolve IDs to ilocs, failing with every unknown ID at once.
    pub(crate) fn node_ilocs<S: AsRef<str>>(&self, nodes: &[S]) -> Result<Vec<Iloc>> {
        let ilocs = self.nodes.ids.to_iloc(nodes.iter().map(AsRef::as_ref));
        self.check_valid(nodes, &ilocs)?;
        Ok(ilocs)
    }

    fn check_valid<S: AsRef<str>>(&self, query: &[S], ilocs: &[Iloc]) -> Result<()> {
        let valid = self.nodes.ids.is_valid(ilocs);
        let missing: Vec<String> = query
            .iter()
            .zip(valid)
            .filter(|(_, ok)| !ok)
            .map(|(id, _)| id.as_ref().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GraphError::MissingNodes(missing))
        }
    }

    pub(crate) fn node_type_iloc(&self, node: Iloc) -> Iloc {
        self.nodes.type_ilocs[node]
    }

    pub(crate) fn node_type_name(&self, node: Iloc) -> &str {
        self.nodes.types.ids()[self.nodes.type_ilocs[node]].as_str()
    }

    pub(crate) fn node_type_iloc_of(&self, node_type: &str) -> Option<Iloc> {
        self.nodes.types.get(node_type)
    }

    fn edge_type_name(&self, edge: Iloc) -> &str {
        self.edges.types.ids()[self.edges.type_ilocs[edge]].as_str()
    }

    pub(crate) fn edge_sources(&self) -> &[Iloc] {
        &self.edges.sources
    }

    pub(crate) fn edge_targets(&self) -> &[Iloc] {
        &self.edges.targets
    }

    fn incident_edges(&self, node: Iloc, direction: Direction) -> Vec<Iloc> {
        match (self.is_directed, direction) {
            (true, Direction::In) => self.edges.edge_ilocs(node, true, false),
            (true, Direction::Out) => self.edges.edge_ilocs(node, false, true),
            _ => self.edges.edge_ilocs(node, true, true),
        }
    }

    fn neighbour_of(&self, edge: Iloc, node: Iloc, direction: Direction) -> Iloc {
        match (self.is_directed, direction) {
            (true, Direction::In) => self.edges.sources[edge],
            (true, Direction::Out) => self.edges.targets[edge],
            _ => self.edges.other_end(edge, node),
        }
    }

    /// Neighbour ilocs, one entry per incident edge.
    pub(crate) fn neighbour_ilocs(&self, node: Iloc, direction: Direction) -> Vec<Iloc> {
        self.incident_edges(node, direction)
            .into_iter()
            .map(|e| self.neighbour_of(e, node, direction))
            .collect()
    }

    /// Neighbour ilocs paired with the weight of the connecting edge.
    pub(crate) fn weighted_neighbour_ilocs(&self, node: Iloc, direction: Direction) -> Vec<(Iloc, f64)> {
        self.incident_edges(node, direction)
            .into_iter()
            .map(|e| (self.neighbour_of(e, node, direction), self.edges.weights[e]))
            .collect()
    }

    fn filtered_edges(
        &self,
        node: &str,
        direction: Direction,
        edge_types: Option<&[&str]>,
    ) -> Result<(Iloc, Vec<Iloc>)> {
        let iloc = self
            .node_iloc(node)
            .ok_or_else(|| GraphError::missing_nodes([node]))?;
        let mut edges = self.incident_edges(iloc, direction);

        if let Some(types) = edge_types {
            let allowed: HashSet<Iloc> = types
                .iter()
                .filter_map(|t| self.edges.types.get(*t))
                .collect();
            edges.retain(|e| allowed.contains(&self.edges.type_ilocs[*e]));
        }
        Ok((iloc, edges))
    }

    fn collect_neighbours(
        &self,
        node: &str,
        direction: Direction,
        edge_types: Option<&[&str]>,
    ) -> Result<Vec<&str>> {
        let (iloc, edges) = self.filtered_edges(node, direction, edge_types)?;
        Ok(edges
            .into_iter()
            .map(|e| self.node_id(self.neighbour_of(e, iloc, direction)))
            .collect())
    }

    fn collect_weighted_neighbours(
        &self,
        node: &str,
        direction: Direction,
        edge_types: Option<&[&str]>,
    ) -> Result<Vec<NeighbourWithWeight<'_>>> {
        let (iloc, edges) = self.filtered_edges(node, direction, edge_types)?;
        Ok(edges
            .into_iter()
            .map(|e| NeighbourWithWeight {
                node: self.node_id(self.neighbour_of(e, iloc, direction)),
                weight: self.edges.weights[e],
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // public neighbourhood queries

    /// Nodes connected to `node` by any incident edge, one entry per edge.
    ///
    /// For directed graphs this is the in- and out-neighbours combined;
    /// duplicates are preserved. `edge_types` restricts the edges followed.
    pub fn neighbors(&self, node: &str, edge_types: Option<&[&str]>) -> Result<Vec<&str>> {
        self.collect_neighbours(node, Direction::Both, edge_types)
    }

    pub fn neighbors_with_weights(
        &self,
        node: &str,
        edge_types: Option<&[&str]>,
    ) -> Result<Vec<NeighbourWithWeight<'_>>> {
        self.collect_weighted_neighbours(node, Direction::Both, edge_types)
    }

    /// Sources of edges into `node`. Same as `neighbors` for undirected graphs.
    pub fn in_nodes(&self, node: &str, edge_types: Option<&[&str]>) -> Result<Vec<&str>> {
        self.collect_neighbours(node, Direction::In, edge_types)
    }

    pub fn in_nodes_with_weights(
        &self,
        node: &str,
        edge_types: Option<&[&str]>,
    ) -> Result<Vec<NeighbourWithWeight<'_>>> {
        self.collect_weighted_neighbours(node, Direction::In, edge_types)
    }

    /// Targets of edges out of `node`. Same as `neighbors` for undirected graphs.
    pub fn out_nodes(&self, node: &str, edge_types: Option<&[&str]>) -> Result<Vec<&str>> {
        self.collect_neighbours(node, Direction::Out, edge_types)
    }

    pub fn out_nodes_with_weights(
        &self,
        node: &str,
        edge_types: Option<&[&str]>,
    ) -> Result<Vec<NeighbourWithWeight<'_>>> {
        self.collect_weighted_neighbours(node, Direction::Out, edge_types)
    }

    // ------------------------------------------------------------------
    // types and features

    /// All node types, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.nodes.types.ids().iter().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Nodes of one type, or every node when `node_type` is `None`.
    pub fn nodes_of_type(&self, node_type: Option<&str>) -> Result<Vec<&str>> {
        let ids = self.nodes.ids.ids();
        match node_type {
            None => Ok(ids.iter().map(String::as_str).collect()),
            Some(nt) => {
                let type_iloc = self.node_type_iloc_of(nt).ok_or_else(|| {
                    GraphError::invalid_parameter(format!("node type '{}' is not in the graph", nt))
                })?;
                Ok(ids[self.nodes.type_range(type_iloc)]
                    .iter()
                    .map(String::as_str)
                    .collect())
            }
        }
    }

    /// Type of a single node.
    pub fn node_type(&self, node: &str) -> Result<&str> {
        let iloc = self
            .node_iloc(node)
            .ok_or_else(|| GraphError::missing_nodes([node]))?;
        Ok(self.node_type_name(iloc))
    }

    /// Types of several nodes; unknown IDs are reported together.
    pub fn node_types_of<S: AsRef<str>>(&self, nodes: &[S]) -> Result<Vec<&str>> {
        let ilocs = self.node_ilocs(nodes)?;
        Ok(ilocs.into_iter().map(|i| self.node_type_name(i)).collect())
    }

    /// Feature width per node type, in type order.
    pub fn node_feature_sizes(&self) -> IndexMap<String, usize> {
        self.nodes
            .types
            .ids()
            .iter()
            .enumerate()
            .map(|(t, name)| (name.clone(), self.nodes.feature_table(t).width))
            .collect()
    }

    /// Errors unless at least one node type carries numeric features.
    pub fn check_graph_for_ml(&self) -> Result<()> {
        if self.node_feature_sizes().values().all(|&size| size == 0) {
            return Err(GraphError::graph_construction(
                "This graph has no numeric feature attributes for nodes. \
                 Node features are required for machine learning",
            ));
        }
        Ok(())
    }

    /// Feature rows for `nodes`.
    ///
    /// `None` entries are padding slots from neighbourhood sampling and
    /// produce all-zero rows. Without an explicit `node_type`, all real
    /// nodes must share one type, which is then inferred.
    pub fn node_features<S: AsRef<str>>(
        &self,
        nodes: &[Option<S>],
        node_type: Option<&str>,
    ) -> Result<FeatureMatrix> {
        let ilocs: Vec<Iloc> = nodes
            .iter()
            .map(|n| match n {
                Some(id) => self.node_iloc(id.as_ref()).unwrap_or(INVALID_ILOC),
                None => INVALID_ILOC,
            })
            .collect();

        let missing: Vec<String> = nodes
            .iter()
            .zip(&ilocs)
            .filter_map(|(n, &iloc)| match n {
                Some(id) if iloc == INVALID_ILOC => Some(id.as_ref().to_string()),
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingNodes(missing));
        }

        let type_iloc = match node_type {
            Some(nt) => self.node_type_iloc_of(nt).ok_or_else(|| {
                GraphError::invalid_parameter(format!("node type '{}' is not in the graph", nt))
            })?,
            None => {
                let mut types: Vec<Iloc> = ilocs
                    .iter()
                    .filter(|&&i| i != INVALID_ILOC)
                    .map(|&i| self.node_type_iloc(i))
                    .collect();
                types.sort_unstable();
                types.dedup();
                match types.as_slice() {
                    [] => {
                        return Err(GraphError::invalid_parameter(
                            "must have at least one node for inference, if `node_type` is not specified",
                        ))
                    }
                    [single] => *single,
                    _ => return Err(GraphError::invalid_parameter("all nodes must have the same type")),
                }
            }
        };

        let wrong_type: Vec<String> = ilocs
            .iter()
            .filter(|&&i| i != INVALID_ILOC && self.node_type_iloc(i) != type_iloc)
            .map(|&i| self.node_id(i).to_string())
            .collect();
        if !wrong_type.is_empty() {
            return Err(GraphError::invalid_parameter(format!(
                "nodes {:?} are not of type '{}'",
                wrong_type,
                self.nodes.types.ids()[type_iloc]
            )));
        }

        let cols = self.nodes.feature_table(type_iloc).width;
        let mut values = vec![0.0f32; ilocs.len() * cols];
        for (row, &iloc) in ilocs.iter().enumerate() {
            if iloc != INVALID_ILOC {
                values[row * cols..(row + 1) * cols].copy_from_slice(self.nodes.features_of(iloc));
            }
        }

        Ok(FeatureMatrix {
            rows: ilocs.len(),
            cols,
            values,
        })
    }

    // ------------------------------------------------------------------
    // derived structures

    /// Degree of every node; a self loop counts once.
    pub fn node_degrees(&self) -> IndexMap<&str, usize> {
        (0..self.nodes.len())
            .map(|n| (self.node_id(n), self.edges.edge_ilocs(n, true, true).len()))
            .collect()
    }

    /// Weights of every edge from `source` to `target` (either direction when
    /// undirected). A self loop is only counted once.
    pub fn edge_weights(&self, source: &str, target: &str) -> Result<Vec<f64>> {
        let ilocs = self.node_ilocs(&[source, target])?;
        let (src, tgt) = (ilocs[0], ilocs[1]);

        let effectively_directed = self.is_directed || src == tgt;
        let both = !effectively_directed;
        let from_source = self.edges.edge_ilocs(src, both, true);
        let into_target: HashSet<Iloc> = self.edges.edge_ilocs(tgt, true, both).into_iter().collect();

        Ok(from_source
            .into_iter()
            .filter(|e| into_target.contains(e))
            .map(|e| self.edges.weights[e])
            .collect())
    }

    /// Sparse adjacency matrix of the whole graph, or of the subgraph induced
    /// by `nodes` (rows/columns then follow the order of `nodes`).
    ///
    /// With `weighted` unset every edge contributes 1. Undirected graphs give
    /// a symmetric matrix where self loops are counted once.
    pub fn to_adjacency_matrix<S: AsRef<str>>(
        &self,
        nodes: Option<&[S]>,
        weighted: bool,
    ) -> Result<AdjacencyMatrix> {
        let index: Vec<Iloc> = match nodes {
            None => (0..self.nodes.len()).collect(),
            Some(subset) => self.node_ilocs(subset)?,
        };

        let local = ExternalIdIndex::new(index.iter().copied());
        let mut triplets = Vec::new();
        for e in 0..self.edges.len() {
            let (Some(row), Some(col)) = (
                local.get(&self.edges.sources[e]),
                local.get(&self.edges.targets[e]),
            ) else {
                continue;
            };
            let value = if weighted { self.edges.weights[e] as f32 } else { 1.0 };
            triplets.push((row, col, value));
            if !self.is_directed && row != col {
                triplets.push((col, row, value));
            }
        }

        Ok(AdjacencyMatrix::from_triplets(local.len(), triplets))
    }

    /// Unique (source type, relation, target type) triples of the edges that
    /// pass `selector`, with their counts, sorted.
    fn unique_type_triples(&self, selector: Option<&[bool]>) -> Vec<(EdgeType, usize)> {
        let mut counts: HashMap<(Iloc, Iloc, Iloc), usize> = HashMap::new();
        for e in 0..self.edges.len() {
            if selector.is_some_and(|s| !s[e]) {
                continue;
            }
            let key = (
                self.node_type_iloc(self.edges.sources[e]),
                self.edges.type_ilocs[e],
                self.node_type_iloc(self.edges.targets[e]),
            );
            *counts.entry(key).or_insert(0) += 1;
        }

        let node_types = self.nodes.types.ids();
        let edge_types = self.edges.types.ids();
        let mut triples: Vec<(EdgeType, usize)> = counts
            .into_iter()
            .map(|((s, r, t), count)| {
                (
                    EdgeType::new(node_types[s].clone(), edge_types[r].clone(), node_types[t].clone()),
                    count,
                )
            })
            .collect();
        triples.sort();
        triples
    }

    /// Derive the schema from the edges, optionally restricted to the
    /// subgraph induced by `nodes`. Undirected graphs also get every reverse
    /// triple.
    pub fn create_graph_schema<S: AsRef<str>>(&self, nodes: Option<&[S]>) -> Result<GraphSchema> {
        let selector = match nodes {
            None => None,
            Some(subset) => {
                let members: HashSet<Iloc> = self.node_ilocs(subset)?.into_iter().collect();
                Some(
                    (0..self.edges.len())
                        .map(|e| {
                            members.contains(&self.edges.sources[e]) && members.contains(&self.edges.targets[e])
                        })
                        .collect::<Vec<bool>>(),
                )
            }
        };

        let node_types: Vec<String> = self.nodes.types.ids().to_vec();
        let mut adjacency: IndexMap<String, Vec<EdgeType>> =
            node_types.iter().map(|nt| (nt.clone(), Vec::new())).collect();
        let mut edge_types = Vec::new();

        for (triple, _) in self.unique_type_triples(selector.as_deref()) {
            if !self.is_directed {
                let reverse = EdgeType::new(triple.n2.clone(), triple.rel.clone(), triple.n1.clone());
                adjacency.entry(reverse.n1.clone()).or_default().push(reverse.clone());
                edge_types.push(reverse);
            }
            adjacency.entry(triple.n1.clone()).or_default().push(triple.clone());
            edge_types.push(triple);
        }

        let schema = GraphSchema::new(self.is_directed, node_types, edge_types, adjacency);
        log::debug!(
            "Created graph schema with {} node types and {} edge types",
            schema.node_types().len(),
            schema.edge_types().len()
        );
        Ok(schema)
    }

    /// Per edge type, the sorted neighbour lists of every node, built on
    /// first use and shared by all later callers.
    pub fn adjacency_types(&self) -> &AdjacencyTypes {
        self.adjacency_types.get_or_init(|| AdjacencyTypes::build(self))
    }

    /// Human-readable summary of node and edge types.
    pub fn info(&self) -> Result<String> {
        let kind = if self.is_directed { "Directed" } else { "Undirected" };
        let mut lines = vec![
            format!("HeteroGraph: {} multigraph", kind),
            format!(" Nodes: {}, Edges: {}", self.number_of_nodes(), self.number_of_edges()),
            String::new(),
            " Node types:".to_string(),
        ];

        let schema = self.create_graph_schema::<&str>(None)?;
        for nt in schema.node_types() {
            let count = self.nodes_of_type(Some(nt.as_str()))?.len();
            lines.push(format!("  {}: [{}]", nt, count));
            let rendered: Vec<String> = schema.edge_types_for(nt).iter().map(ToString::to_string).collect();
            lines.push(format!("    Edge types: {}", rendered.join(", ")));
        }

        lines.push(String::new());
        lines.push(" Edge types:".to_string());
        for (triple, count) in self.unique_type_triples(None) {
            lines.push(format!("    {}: [{}]", triple, count));
        }

        Ok(lines.join("\n"))
    }
}
