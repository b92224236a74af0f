use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::graph::builder::{GraphBuilder, GraphConfig};
use crate::graph::hetero_graph::HeteroGraph;

const SCHEMA_INFERENCE_RECORDS: usize = 1000;

/// Read a headered CSV file into a single batch, inferring column types.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let mut file = File::open(path.as_ref())?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, Some(SCHEMA_INFERENCE_RECORDS))?;
    file.rewind()?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone()).with_header(true).build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

    log::debug!(
        "Read {} rows from {}",
        batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
        path.as_ref().display()
    );
    Ok(concat_batches(&schema, &batches)?)
}

impl HeteroGraph {
    /// Load a single-type graph from CSV files. Without a node file, nodes are
    /// inferred from the edge endpoints and carry no features.
    pub fn from_csv_files<P: AsRef<Path>>(
        nodes_path: Option<P>,
        edges_path: P,
        config: GraphConfig,
    ) -> Result<Self> {
        let mut builder = GraphBuilder::new(config).add_default_edges(read_csv(edges_path)?);
        if let Some(path) = nodes_path {
            builder = builder.add_default_nodes(read_csv(path)?);
        }
        builder.build()
    }
}
