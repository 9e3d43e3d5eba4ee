use std::sync::Arc;

use extract::Gazetteer;

use crate::error::RetrievalError;
use crate::neo4j_store::GraphStore;
use crate::schema::GraphContext;

/// Hard cap on nodes returned for one question.
pub const MAX_CONTEXT_NODES: usize = 20;
pub const MAX_CONTEXT_RELATIONSHIPS: usize = 50;

/// Resolves a question to the graph neighbourhood of the entities it names.
#[derive(Clone)]
pub struct GraphRetriever {
    gazetteer: Arc<Gazetteer>,
    store: Arc<dyn GraphStore>,
}

impl GraphRetriever {
    pub fn new(gazetteer: Gazetteer, store: Arc<dyn GraphStore>) -> Self {
        Self {
            gazetteer: Arc::new(gazetteer),
            store,
        }
    }

    pub async fn search(&self, question: &str) -> Result<GraphContext, RetrievalError> {
        // Step 1: Find known entities
        let entities = self.gazetteer.extract(question);
        if entities.is_empty() {
            tracing::debug!("No known entities in question, skipping graph store");
            return Ok(GraphContext::default());
        }

        tracing::debug!(entities = ?entities, "Entities extracted");

        // Step 2: Seed nodes and their 1-2 hop neighbourhood
        let mut nodes = self.store.neighborhood(&entities, MAX_CONTEXT_NODES).await?;
        nodes.truncate(MAX_CONTEXT_NODES);

        let mut context = GraphContext {
            nodes,
            relationships: Vec::new(),
        };

        // Step 3: Relationships among the nodes we kept
        let ids = context.node_ids();
        if !ids.is_empty() {
            context.relationships = self
                .store
                .relationships_between(&ids, MAX_CONTEXT_RELATIONSHIPS)
                .await?;
        }

        tracing::debug!(
            nodes = context.nodes.len(),
            relationships = context.relationships.len(),
            "Graph context assembled"
        );

        Ok(context)
    }
}
