pub mod error;
pub mod neo4j_store;
pub mod retriever;
pub mod schema;

pub use error::RetrievalError;
pub use neo4j_store::{GraphStore, Neo4jConfig, Neo4jStore};
pub use retriever::{GraphRetriever, MAX_CONTEXT_NODES, MAX_CONTEXT_RELATIONSHIPS};
pub use schema::{GraphContext, Node, Relationship};
