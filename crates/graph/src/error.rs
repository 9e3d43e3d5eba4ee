/// Failures talking to the graph store.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("graph query failed: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("error iterating results: {0}")]
    Row(String),
}
