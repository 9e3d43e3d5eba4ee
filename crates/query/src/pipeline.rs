use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use events::{EventSink, IncomingQuery, QueryAnalytics};
use graph::{GraphContext, GraphRetriever, RetrievalError};

use crate::llm::{AnswerGenerator, GenerationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub answer: String,
    pub context: GraphContext,
    pub sources: Vec<String>,
    pub process_time_ms: u64,
}

/// First failing stage of a query, with the stage's own error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("graph search failed: {0}")]
    GraphSearch(#[source] RetrievalError),

    #[error("LLM generation failed: {0}")]
    Generation(#[source] GenerationError),
}

impl PipelineError {
    /// Stable machine-readable stage name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GraphSearch(_) => "graph_search_failed",
            Self::Generation(_) => "llm_generation_failed",
        }
    }
}

/// Retrieval, then generation, then response assembly for one question.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: GraphRetriever,
    generator: Option<Arc<dyn AnswerGenerator>>,
    events: Option<EventSink>,
}

impl QueryPipeline {
    /// `generator` is `None` in degraded mode (no LLM key); queries then fail
    /// at the generation stage.
    pub fn new(
        retriever: GraphRetriever,
        generator: Option<Arc<dyn AnswerGenerator>>,
        events: Option<EventSink>,
    ) -> Self {
        Self {
            retriever,
            generator,
            events,
        }
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn handle(&self, question: &str) -> Result<QueryResponse, PipelineError> {
        let start = Instant::now();
        let query_id = Uuid::new_v4().to_string();

        tracing::info!(query_id = %query_id, question = %question, "New query received");

        if let Some(events) = &self.events {
            events.query_received(IncomingQuery::now(&query_id, question));
        }

        let context = self.retriever.search(question).await.map_err(|e| {
            tracing::error!(query_id = %query_id, error = %e, "Graph search failed");
            PipelineError::GraphSearch(e)
        })?;

        let answer = match &self.generator {
            Some(generator) => generator.generate(question, &context).await,
            None => Err(GenerationError::Disabled),
        }
        .map_err(|e| {
            tracing::error!(query_id = %query_id, error = %e, "LLM generation failed");
            PipelineError::Generation(e)
        })?;

        let sources = context.source_names();
        let process_time_ms = start.elapsed().as_millis() as u64;

        if let Some(events) = &self.events {
            events.query_completed(QueryAnalytics {
                query_id: query_id.clone(),
                process_time_ms,
                nodes_found: context.nodes.len(),
                sources_count: sources.len(),
            });
        }

        tracing::info!(query_id = %query_id, time_ms = process_time_ms, "Query processed");

        Ok(QueryResponse {
            query_id,
            answer,
            context,
            sources,
            process_time_ms,
        })
    }
}
