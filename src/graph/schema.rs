use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// (source node type, relation, target node type)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeType {
    pub n1: String,
    pub rel: String,
    pub n2: String,
}

impl EdgeType {
    pub fn new<A: Into<String>, B: Into<String>, C: Into<String>>(n1: A, rel: B, n2: C) -> Self {
        EdgeType {
            n1: n1.into(),
            rel: rel.into(),
            n2: n2.into(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}->{}", self.n1, self.rel, self.n2)
    }
}

/// Typed schema of a graph: node types, edge-type triples, and the legal
/// outgoing triples of every node type. All collections are sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSchema {
    is_directed: bool,
    node_types: Vec<String>,
    edge_types: Vec<EdgeType>,
    schema: IndexMap<String, Vec<EdgeType>>,
}

/// One entry of a type adjacency list: a node type and the indices of the
/// entries sampled from it at the next hop.
pub type TypeAdjacency = (String, Vec<usize>);

impl GraphSchema {
    /// `node_types` and `edge_types` are sorted; `adjacency` lists each node
    /// type's outgoing triples.
    pub fn new(
        is_directed: bool,
        mut node_types: Vec<String>,
        mut edge_types: Vec<EdgeType>,
        adjacency: IndexMap<String, Vec<EdgeType>>,
    ) -> Self {
        node_types.sort();
        node_types.dedup();
        edge_types.sort();
        edge_types.dedup();

        let schema = node_types
            .iter()
            .map(|nt| {
                let mut triples = adjacency.get(nt).cloned().unwrap_or_default();
                triples.sort();
                triples.dedup();
                (nt.clone(), triples)
            })
            .collect();

        GraphSchema {
            is_directed,
            node_types,
            edge_types,
            schema,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    pub fn node_types(&self) -> &[String] {
        &self.node_types
    }

    pub fn edge_types(&self) -> &[EdgeType] {
        &self.edge_types
    }

    /// Legal outgoing edge types of a node type (empty for unknown types).
    pub fn edge_types_for(&self, node_type: &str) -> &[EdgeType] {
        self.schema.get(node_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_index(&self, node_type: &str) -> Result<usize> {
        self.node_types
            .binary_search_by(|nt| nt.as_str().cmp(node_type))
            .map_err(|_| GraphError::invalid_parameter(format!("node type '{}' is not in the schema", node_type)))
    }

    pub fn edge_index(&self, edge_type: &EdgeType) -> Result<usize> {
        self.edge_types
            .binary_search(edge_type)
            .map_err(|_| GraphError::invalid_parameter(format!("edge type '{}' is not in the schema", edge_type)))
    }

    /// Flattened per-hop sampling plan for heterogeneous neighbourhood samples.
    ///
    /// Entry `i < head_node_types.len()` is the i-th head; every other entry is
    /// the node type reached through one edge type of its parent, in
    /// breadth-first order. Each entry lists the indices of its children.
    pub fn type_adjacency_list(
        &self,
        head_node_types: &[String],
        num_hops: usize,
    ) -> Result<Vec<TypeAdjacency>> {
        for head in head_node_types {
            self.node_index(head)?;
        }

        let mut plan: Vec<TypeAdjacency> = head_node_types
            .iter()
            .map(|nt| (nt.clone(), Vec::new()))
            .collect();

        let mut queue: VecDeque<(String, usize, usize)> = VecDeque::new();
        if num_hops > 0 {
            for (idx, head) in head_node_types.iter().enumerate() {
                queue.push_back((head.clone(), idx, 0));
            }
        }

        while let Some((node_type, idx, depth)) = queue.pop_front() {
            for edge_type in self.edge_types_for(&node_type) {
                let child = plan.len();
                plan[idx].1.push(child);
                plan.push((edge_type.n2.clone(), Vec::new()));
                if depth + 1 < num_hops {
                    queue.push_back((edge_type.n2.clone(), child, depth + 1));
                }
            }
        }

        Ok(plan)
    }
}

impl fmt::Display for GraphSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_directed { "Directed" } else { "Undirected" };
        writeln!(f, "{} schema:", kind)?;
        for (node_type, triples) in &self.schema {
            let rendered: Vec<String> = triples.iter().map(ToString::to_string).collect();
            writeln!(f, "  {}: [{}]", node_type, rendered.join(", "))?;
        }
        Ok(())
    }
}
