pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Graph construction error: {0}")]
    GraphConstruction(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every unknown ID from a single lookup, not just the first one.
    #[error("Nodes not found: {}", format_ids(.0))]
    MissingNodes(Vec<String>),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("{message} (successes={successes}, failures={failures})")]
    NonConvergence {
        successes: usize,
        failures: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_ids(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("{:?}", id))
        .collect::<Vec<_>>()
        .join(", ")
}

impl GraphError {
    pub fn graph_construction<S: Into<String>>(msg: S) -> Self {
        GraphError::GraphConstruction(msg.into())
    }

    pub fn algorithm<S: Into<String>>(msg: S) -> Self {
        GraphError::Algorithm(msg.into())
    }

    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        GraphError::InvalidParameter(msg.into())
    }

    pub fn data_integrity<S: Into<String>>(msg: S) -> Self {
        GraphError::DataIntegrity(msg.into())
    }

    pub fn missing_nodes<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GraphError::MissingNodes(ids.into_iter().map(Into::into).collect())
    }

    /// The offending IDs when this is a missing-node error.
    pub fn missing_ids(&self) -> Option<&[String]> {
        match self {
            GraphError::MissingNodes(ids) => Some(ids),
            _ => None,
        }
    }
}
