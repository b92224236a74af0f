use std::ops::Range;

use crate::graph::id_index::{ExternalIdIndex, Iloc};

/// Row-major feature storage for all nodes of one type.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub width: usize,
    pub values: Vec<f32>,
}

impl FeatureTable {
    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.width..(row + 1) * self.width]
    }
}

/// Node table. Nodes of the same type occupy one contiguous iloc range.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub ids: ExternalIdIndex<String>,
    pub types: ExternalIdIndex<String>,
    pub type_ilocs: Vec<Iloc>,
    type_ranges: Vec<Range<Iloc>>,
    features: Vec<FeatureTable>,
}

impl NodeData {
    /// Append a block of nodes of one type. Returns the IDs that were already
    /// present in the table; those are skipped.
    pub(crate) fn push_type(
        &mut self,
        node_type: &str,
        ids: Vec<String>,
        features: FeatureTable,
    ) -> Vec<String> {
        let type_iloc = self.types.insert(node_type.to_string());
        let start = self.ids.len();
        let mut duplicates = Vec::new();

        for id in ids {
            if self.ids.contains(id.as_str()) {
                duplicates.push(id);
                continue;
            }
            self.ids.insert(id);
            self.type_ilocs.push(type_iloc);
        }

        let end = self.ids.len();
        if type_iloc == self.type_ranges.len() {
            self.type_ranges.push(start..end);
            self.features.push(features);
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn type_range(&self, type_iloc: Iloc) -> Range<Iloc> {
        self.type_ranges[type_iloc].clone()
    }

    pub fn feature_table(&self, type_iloc: Iloc) -> &FeatureTable {
        &self.features[type_iloc]
    }

    /// Feature row of a node, addressed by its global iloc.
    pub fn features_of(&self, node: Iloc) -> &[f32] {
        let type_iloc = self.type_ilocs[node];
        let row = node - self.type_ranges[type_iloc].start;
        self.features[type_iloc].row(row)
    }
}

/// Compressed per-node incidence lists of edge ilocs, in ascending edge order.
#[derive(Debug, Clone, Default)]
pub struct Incidence {
    offsets: Vec<usize>,
    edges: Vec<Iloc>,
}

impl Incidence {
    /// Counting-sort build: `endpoints[e]` is the node that edge `e` is filed under.
    pub fn from_endpoints(num_nodes: usize, endpoints: &[Iloc]) -> Self {
        let mut counts = vec![0usize; num_nodes];
        for &node in endpoints {
            counts[node] += 1;
        }

        let mut offsets = Vec::with_capacity(num_nodes + 1);
        let mut running = 0;
        offsets.push(0);
        for count in counts {
            running += count;
            offsets.push(running);
        }

        let mut edges = vec![0; endpoints.len()];
        let mut cursors = offsets.clone();
        for (edge, &node) in endpoints.iter().enumerate() {
            edges[cursors[node]] = edge;
            cursors[node] += 1;
        }

        Incidence { offsets, edges }
    }

    pub fn get(&self, node: Iloc) -> &[Iloc] {
        match (self.offsets.get(node), self.offsets.get(node + 1)) {
            (Some(&start), Some(&end)) => &self.edges[start..end],
            _ => &[],
        }
    }
}

/// Edge table plus incidence indexes for both directions.
#[derive(Debug, Clone, Default)]
pub struct EdgeData {
    pub types: ExternalIdIndex<String>,
    pub sources: Vec<Iloc>,
    pub targets: Vec<Iloc>,
    pub type_ilocs: Vec<Iloc>,
    pub weights: Vec<f64>,
    outgoing: Incidence,
    incoming: Incidence,
}

impl EdgeData {
    pub(crate) fn push(&mut self, source: Iloc, target: Iloc, edge_type: Iloc, weight: f64) {
        self.sources.push(source);
        self.targets.push(target);
        self.type_ilocs.push(edge_type);
        self.weights.push(weight);
    }

    /// Build the incidence indexes; must be called once all edges are pushed.
    pub(crate) fn index(&mut self, num_nodes: usize) {
        self.outgoing = Incidence::from_endpoints(num_nodes, &self.sources);
        self.incoming = Incidence::from_endpoints(num_nodes, &self.targets);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Edge ilocs incident to `node`, sorted and without repeats.
    ///
    /// A self loop is both incoming and outgoing but is reported once.
    pub fn edge_ilocs(&self, node: Iloc, ins: bool, outs: bool) -> Vec<Iloc> {
        let incoming: &[Iloc] = if ins { self.incoming.get(node) } else { &[] };
        let outgoing: &[Iloc] = if outs { self.outgoing.get(node) } else { &[] };

        let mut merged = Vec::with_capacity(incoming.len() + outgoing.len());
        let (mut i, mut o) = (0, 0);
        while i < incoming.len() && o < outgoing.len() {
            let (a, b) = (incoming[i], outgoing[o]);
            if a < b {
                merged.push(a);
                i += 1;
            } else if b < a {
                merged.push(b);
                o += 1;
            } else {
                merged.push(a);
                i += 1;
                o += 1;
            }
        }
        merged.extend_from_slice(&incoming[i..]);
        merged.extend_from_slice(&outgoing[o..]);
        merged
    }

    /// The endpoint of `edge` that is not `node` (or `node` itself for a self loop).
    pub fn other_end(&self, edge: Iloc, node: Iloc) -> Iloc {
        if self.sources[edge] == node {
            self.targets[edge]
        } else {
            self.sources[edge]
        }
    }
}
