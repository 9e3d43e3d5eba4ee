use async_trait::async_trait;
use dashmap::DashMap;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder};
use rskafka::record::Record;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::PublishError;
use crate::sink::EventPublisher;

/// Writes events to partition 0 of each topic.
///
/// The broker connection is opened on first publish, so a Kafka outage at
/// boot does not stop the service.
pub struct KafkaPublisher {
    brokers: Vec<String>,
    client: OnceCell<Client>,
    partitions: DashMap<String, Arc<PartitionClient>>,
}

impl KafkaPublisher {
    pub fn new(brokers: Vec<String>) -> Self {
        Self {
            brokers,
            client: OnceCell::new(),
            partitions: DashMap::new(),
        }
    }

    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    async fn partition(&self, topic: &str) -> Result<Arc<PartitionClient>, PublishError> {
        if let Some(existing) = self.partitions.get(topic).map(|p| Arc::clone(p.value())) {
            return Ok(existing);
        }

        let client = self
            .client
            .get_or_try_init(|| async {
                ClientBuilder::new(self.brokers.clone())
                    .build()
                    .await
                    .map_err(|e| PublishError::Connection(e.to_string()))
            })
            .await?;

        let partition = client
            .partition_client(topic.to_string(), 0, UnknownTopicHandling::Error)
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        let partition = Arc::new(partition);
        self.partitions.insert(topic.to_string(), Arc::clone(&partition));
        Ok(partition)
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), PublishError> {
        let record = Record {
            key: Some(key.as_bytes().to_vec()),
            value: Some(serde_json::to_vec(payload)?),
            headers: BTreeMap::new(),
            timestamp: chrono::Utc::now(),
        };

        self.partition(topic)
            .await?
            .produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|e| PublishError::Write(e.to_string()))?;

        Ok(())
    }
}

