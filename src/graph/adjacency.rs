use std::sync::Arc;

use arrow::array::{Float32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use hashbrown::HashMap;

use crate::error::{GraphError, Result};
use crate::graph::hetero_graph::HeteroGraph;
use crate::graph::id_index::Iloc;
use crate::graph::schema::EdgeType;

/// Square sparse matrix in compressed sparse row form; duplicate entries are
/// summed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    size: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl AdjacencyMatrix {
    pub fn from_triplets(size: usize, mut triplets: Vec<(usize, usize, f32)>) -> Self {
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; size + 1];
        let mut indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut data: Vec<f32> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in triplets {
            if last == Some((row, col)) {
                if let Some(v) = data.last_mut() {
                    *v += value;
                }
                continue;
            }
            indices.push(col);
            data.push(value);
            indptr[row + 1] += 1;
            last = Some((row, col));
        }

        for i in 0..size {
            indptr[i + 1] += indptr[i];
        }

        AdjacencyMatrix {
            size,
            indptr,
            indices,
            data,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.size, self.size)
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.size {
            return 0.0;
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        match self.indices[start..end].binary_search(&col) {
            Ok(pos) => self.data[start + pos],
            Err(_) => 0.0,
        }
    }

    /// Column indices and values of one row.
    pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Dense row-major copy; only sensible for small graphs.
    pub fn to_dense(&self) -> Vec<Vec<f32>> {
        let mut dense = vec![vec![0.0; self.size]; self.size];
        for (r, dense_row) in dense.iter_mut().enumerate() {
            let (cols, values) = self.row(r);
            for (&c, &v) in cols.iter().zip(values) {
                dense_row[c] = v;
            }
        }
        dense
    }

    /// Coordinate-format table with columns `row`, `col`, `weight`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut rows = Vec::with_capacity(self.nnz());
        for r in 0..self.size {
            let (start, end) = (self.indptr[r], self.indptr[r + 1]);
            rows.extend(std::iter::repeat(r as u64).take(end - start));
        }
        let cols: Vec<u64> = self.indices.iter().map(|&c| c as u64).collect();

        let schema = Arc::new(Schema::new(vec![
            Field::new("row", DataType::UInt64, false),
            Field::new("col", DataType::UInt64, false),
            Field::new("weight", DataType::Float32, false),
        ]));

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(UInt64Array::from(rows)),
                Arc::new(UInt64Array::from(cols)),
                Arc::new(Float32Array::from(self.data.clone())),
            ],
        )
        .map_err(GraphError::from)
    }
}

/// For every edge-type triple, each node's neighbours through that triple.
///
/// Neighbour lists are sorted by external node ID so that seeded sampling is
/// reproducible regardless of edge insertion order.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyTypes {
    by_type: HashMap<EdgeType, HashMap<Iloc, Vec<Iloc>>>,
}

impl AdjacencyTypes {
    pub(crate) fn build(graph: &HeteroGraph) -> Self {
        let mut by_type: HashMap<EdgeType, HashMap<Iloc, Vec<Iloc>>> = HashMap::new();
        let rel_names: Vec<&str> = graph
            .edges_with_types()
            .into_iter()
            .map(|(_, _, rel)| rel)
            .collect();

        for (e, (&src, &tgt)) in graph.edge_sources().iter().zip(graph.edge_targets()).enumerate() {
            let src_type = graph.node_type_name(src);
            let tgt_type = graph.node_type_name(tgt);
            let rel = rel_names[e];

            by_type
                .entry(EdgeType::new(src_type, rel, tgt_type))
                .or_default()
                .entry(src)
                .or_default()
                .push(tgt);

            if !graph.is_directed() && src != tgt {
                by_type
                    .entry(EdgeType::new(tgt_type, rel, src_type))
                    .or_default()
                    .entry(tgt)
                    .or_default()
                    .push(src);
            }
        }

        for per_node in by_type.values_mut() {
            for neighbours in per_node.values_mut() {
                neighbours.sort_by(|a, b| graph.node_id(*a).cmp(graph.node_id(*b)));
            }
        }

        log::debug!("Built adjacency lists for {} edge types", by_type.len());
        AdjacencyTypes { by_type }
    }

    /// Neighbours of `node` through `edge_type`; empty when there are none.
    pub fn neighbours(&self, edge_type: &EdgeType, node: Iloc) -> &[Iloc] {
        self.by_type
            .get(edge_type)
            .and_then(|per_node| per_node.get(&node))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.by_type.keys()
    }
}
