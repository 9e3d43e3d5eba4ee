use serde::{Deserialize, Serialize};

/// Published when a question arrives, before retrieval starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingQuery {
    pub query_id: String,
    pub question: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl IncomingQuery {
    pub fn now(query_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            question: question.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Published once an answer has been produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalytics {
    pub query_id: String,
    pub process_time_ms: u64,
    pub nodes_found: usize,
    pub sources_count: usize,
}
