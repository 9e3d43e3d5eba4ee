//! Fire-and-forget lifecycle events for the query pipeline.

pub mod kafka;
pub mod payload;
pub mod sink;

pub use kafka::KafkaPublisher;
pub use payload::{IncomingQuery, QueryAnalytics};
pub use sink::{EventPublisher, EventSink, EventTopics};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("error connecting to kafka: {0}")]
    Connection(String),

    #[error("error marshaling event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("error writing to kafka: {0}")]
    Write(String),
}
