use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::PublishError;
use crate::payload::{IncomingQuery, QueryAnalytics};

/// Append-only event bus accepting topic/key/JSON messages.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTopics {
    pub queries_incoming: String,
    pub analytics: String,
}

impl Default for EventTopics {
    fn default() -> Self {
        Self {
            queries_incoming: "starwars.queries.incoming".to_string(),
            analytics: "starwars.analytics".to_string(),
        }
    }
}

/// Non-blocking front end over an [`EventPublisher`].
///
/// Every emit runs on its own task with its own deadline. Failures are
/// logged and never reach the caller.
#[derive(Clone)]
pub struct EventSink {
    publisher: Arc<dyn EventPublisher>,
    topics: EventTopics,
    timeout: Duration,
}

impl EventSink {
    pub fn new(publisher: Arc<dyn EventPublisher>, topics: EventTopics) -> Self {
        Self {
            publisher,
            topics,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn query_received(&self, event: IncomingQuery) -> JoinHandle<()> {
        let key = event.query_id.clone();
        self.emit(self.topics.queries_incoming.clone(), key, event)
    }

    pub fn query_completed(&self, event: QueryAnalytics) -> JoinHandle<()> {
        let key = event.query_id.clone();
        self.emit(self.topics.analytics.clone(), key, event)
    }

    /// Spawn the publish and return immediately. The handle is only useful
    /// to tests; production callers drop it.
    pub fn emit<T>(&self, topic: String, key: String, event: T) -> JoinHandle<()>
    where
        T: Serialize + Send + 'static,
    {
        let publisher = Arc::clone(&self.publisher);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let payload = match serde_json::to_value(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(topic = %topic, key = %key, error = %e, "Dropping unserializable event");
                    return;
                }
            };

            match tokio::time::timeout(timeout, publisher.publish(&topic, &key, &payload)).await {
                Ok(Ok(())) => tracing::debug!(topic = %topic, key = %key, "Event published"),
                Ok(Err(e)) => {
                    tracing::warn!(topic = %topic, key = %key, error = %e, "Event publish failed")
                }
                Err(_) => tracing::warn!(
                    topic = %topic,
                    key = %key,
                    timeout_ms = timeout.as_millis() as u64,
                    "Event publish timed out"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<(String, String, Value)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), PublishError> {
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string(), payload.clone()));
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _: &str, _: &str, _: &Value) -> Result<(), PublishError> {
            Err(PublishError::Write("broker down".to_string()))
        }
    }

    struct StuckPublisher;

    #[async_trait]
    impl EventPublisher for StuckPublisher {
        async fn publish(&self, _: &str, _: &str, _: &Value) -> Result<(), PublishError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_events_routed_to_topics() {
        let publisher = Arc::new(RecordingPublisher::default());
        let sink = EventSink::new(publisher.clone(), EventTopics::default());

        sink.query_received(IncomingQuery {
            query_id: "q1".to_string(),
            question: "Who is Yoda?".to_string(),
            timestamp: 1_700_000_000,
        })
        .await
        .unwrap();
        sink.query_completed(QueryAnalytics {
            query_id: "q1".to_string(),
            process_time_ms: 12,
            nodes_found: 3,
            sources_count: 2,
        })
        .await
        .unwrap();

        let sent = publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);

        assert_eq!(sent[0].0, "starwars.queries.incoming");
        assert_eq!(sent[0].1, "q1");
        assert_eq!(sent[0].2["question"], "Who is Yoda?");

        assert_eq!(sent[1].0, "starwars.analytics");
        assert_eq!(sent[1].2["nodes_found"], 3);
        assert_eq!(sent[1].2["sources_count"], 2);
    }

    #[tokio::test]
    async fn test_publish_errors_are_swallowed() {
        let sink = EventSink::new(Arc::new(FailingPublisher), EventTopics::default());

        let handle = sink.emit("t".to_string(), "k".to_string(), serde_json::json!({}));

        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_bounded_by_timeout() {
        let sink = EventSink::new(Arc::new(StuckPublisher), EventTopics::default())
            .with_timeout(Duration::from_millis(20));

        let handle = sink.emit("t".to_string(), "k".to_string(), serde_json::json!({}));

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("emit should give up after its own timeout")
            .unwrap();
    }
}
