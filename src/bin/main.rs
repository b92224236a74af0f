use std::io::Write;
use std::path::PathBuf;

use arrow::json::LineDelimitedWriter;
use arrow_graph_walks::prelude::*;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arrow-graph-walks")]
#[command(about = "Random walks and neighbourhood sampling over graphs stored as Arrow tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sampler and print the walks as newline-delimited JSON
    Walk {
        #[arg(short, long)]
        edges: PathBuf,
        #[arg(short, long)]
        nodes: Option<PathBuf>,
        #[arg(short, long)]
        directed: bool,
        #[arg(short, long, default_value = "uniform_random_walk")]
        algorithm: String,
        /// Sampler parameters as a JSON object, e.g. '{"length": 5, "seed": 1}'
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// Print a summary of node and edge types
    Info {
        #[arg(short, long)]
        edges: PathBuf,
        #[arg(short, long)]
        nodes: Option<PathBuf>,
        #[arg(short, long)]
        directed: bool,
    },
}

const ALGORITHMS: &[&str] = &[
    "uniform_random_walk",
    "biased_random_walk",
    "metapath_walk",
    "breadth_first_walk",
    "heterogeneous_breadth_first_walk",
    "directed_breadth_first_neighbours",
    "temporal_random_walk",
];

fn load_graph(edges: PathBuf, nodes: Option<PathBuf>, directed: bool) -> Result<HeteroGraph> {
    let config = GraphConfig {
        directed,
        ..GraphConfig::default()
    };
    HeteroGraph::from_csv_files(nodes, edges, config)
}

fn create_sampler<'g>(
    name: &str,
    graph: &'g HeteroGraph,
    seed: Option<u64>,
) -> Result<Box<dyn GraphWalk + 'g>> {
    let sampler: Box<dyn GraphWalk + 'g> = match name {
        "uniform_random_walk" => Box::new(UniformRandomWalk::new(graph, None, seed)?),
        "biased_random_walk" => Box::new(BiasedRandomWalk::new(graph, None, seed)?),
        "metapath_walk" => Box::new(UniformRandomMetaPathWalk::new(graph, None, seed)?),
        "breadth_first_walk" => Box::new(SampledBreadthFirstWalk::new(graph, None, seed)?),
        "heterogeneous_breadth_first_walk" => Box::new(SampledHeterogeneousBreadthFirstWalk::new(graph, None, seed)?),
        "directed_breadth_first_neighbours" => Box::new(DirectedBreadthFirstNeighbours::new(graph, None, seed)?),
        "temporal_random_walk" => Box::new(TemporalRandomWalk::new(graph, None, seed)?),
        other => {
            return Err(GraphError::invalid_parameter(format!(
                "unknown algorithm '{}', expected one of: {}",
                other,
                ALGORITHMS.join(", ")
            )))
        }
    };
    Ok(sampler)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Walk {
            edges,
            nodes,
            directed,
            algorithm,
            params,
        } => {
            let graph = load_graph(edges, nodes, directed)?;
            let params = AlgorithmParams::from_json(&params)?;
            let sampler = create_sampler(&algorithm, &graph, params.optional("seed")?)?;

            log::info!("Running {}: {}", sampler.name(), sampler.description());
            let batch = sampler.execute(&params)?;

            let stdout = std::io::stdout();
            let mut writer = LineDelimitedWriter::new(stdout.lock());
            writer.write(&batch)?;
            writer.finish()?;
            writer.into_inner().flush()?;
        }
        Commands::Info { edges, nodes, directed } => {
            let graph = load_graph(edges, nodes, directed)?;
            println!("{}", graph.info()?);
        }
    }

    Ok(())
}
