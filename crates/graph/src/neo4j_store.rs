use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Row};
use serde_json::{Map, Value};

use crate::error::RetrievalError;
use crate::schema::{Node, Relationship};

/// Read access to the knowledge graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Nodes named in `names` plus everything reachable within two hops,
    /// seeds included, at most `limit` rows.
    async fn neighborhood(&self, names: &[String], limit: usize) -> Result<Vec<Node>, RetrievalError>;

    /// Relationships whose endpoints are both in `ids`.
    async fn relationships_between(
        &self,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<Relationship>, RetrievalError>;
}

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            max_connections: 16,
        }
    }
}

const NEIGHBORHOOD_QUERY: &str = r#"
    MATCH (n)
    WHERE n.name IN $entities
    OPTIONAL MATCH path = (n)-[*1..2]-(related)
    WITH n, coalesce(nodes(path), [n]) AS path_nodes
    UNWIND path_nodes AS node
    WITH DISTINCT node
    RETURN node.id AS id,
           labels(node)[0] AS label,
           node.name AS name,
           properties(node) AS props
    LIMIT $limit
"#;

const RELATIONSHIPS_QUERY: &str = r#"
    MATCH (source)
    WHERE toString(source.id) IN $ids
    MATCH (source)-[r]->(target)
    WHERE toString(target.id) IN $ids
    RETURN DISTINCT type(r) AS type,
           toString(source.id) AS source,
           toString(target.id) AS target
    LIMIT $limit
"#;

/// Neo4j-backed graph store. Clone is cheap (pooled connections).
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Connect and verify the server answers a trivial query.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, RetrievalError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| RetrievalError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| RetrievalError::Connection(e.to_string()))?;

        let store = Self { graph };
        store.ping().await?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(store)
    }

    pub async fn ping(&self) -> Result<(), RetrievalError> {
        self.graph
            .run(neo4rs::query("RETURN 1"))
            .await
            .map_err(|e| RetrievalError::Connection(e.to_string()))
    }

    async fn fetch_rows(&self, query: Query) -> Result<Vec<Row>, RetrievalError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();

        while let Some(row) = stream.next().await? {
            rows.push(row);
        }

        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn neighborhood(&self, names: &[String], limit: usize) -> Result<Vec<Node>, RetrievalError> {
        let query = neo4rs::query(NEIGHBORHOOD_QUERY)
            .param("entities", names.to_vec())
            .param("limit", limit as i64);

        self.fetch_rows(query)
            .await?
            .iter()
            .map(row_to_node)
            .collect()
    }

    async fn relationships_between(
        &self,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<Relationship>, RetrievalError> {
        let query = neo4rs::query(RELATIONSHIPS_QUERY)
            .param("ids", ids.to_vec())
            .param("limit", limit as i64);

        self.fetch_rows(query)
            .await?
            .iter()
            .map(row_to_relationship)
            .collect()
    }
}

fn row_to_relationship(row: &Row) -> Result<Relationship, RetrievalError> {
    Ok(Relationship {
        rel_type: row.get("type").map_err(|e| RetrievalError::Row(e.to_string()))?,
        source: row.get("source").map_err(|e| RetrievalError::Row(e.to_string()))?,
        target: row.get("target").map_err(|e| RetrievalError::Row(e.to_string()))?,
    })
}

fn row_to_node(row: &Row) -> Result<Node, RetrievalError> {
    let id: Option<Value> = row.get("id").map_err(|e| RetrievalError::Row(e.to_string()))?;
    let label: Option<String> = row.get("label").map_err(|e| RetrievalError::Row(e.to_string()))?;
    let name: Option<Value> = row.get("name").map_err(|e| RetrievalError::Row(e.to_string()))?;
    let properties: Map<String, Value> =
        row.get("props").map_err(|e| RetrievalError::Row(e.to_string()))?;

    Ok(Node {
        id: display_value(id),
        label: label.unwrap_or_default(),
        name: display_value(name),
        properties,
    })
}

/// Render a scalar property the way it reads, without JSON quoting.
fn display_value(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}
