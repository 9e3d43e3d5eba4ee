use anyhow::{Context, Result};
use serde::Serialize;

use events::EventTopics;
use extract::DEFAULT_ENTITIES;
use graph::Neo4jConfig;

/// Service configuration, read from the environment (and `.env`).
///
/// Empty variables count as unset, so `FOO=` falls back to the default.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub service_name: String,
    pub port: u16,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub neo4j: GraphStoreConfig,
    pub llm: LlmConfig,
    pub kafka: KafkaConfig,
    pub gazetteer: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStoreConfig {
    pub uri: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KafkaConfig {
    pub enabled: bool,
    pub brokers: Vec<String>,
    pub topic_queries_incoming: String,
    pub topic_analytics: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let topics = EventTopics::default();
        Self {
            service_name: "srv-yoda".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            request_timeout_secs: 30,
            neo4j: GraphStoreConfig {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                password: "password".to_string(),
            },
            llm: LlmConfig {
                api_key: String::new(),
                model: query::llm::DEFAULT_MODEL.to_string(),
                base_url: query::llm::DEFAULT_BASE_URL.to_string(),
            },
            kafka: KafkaConfig {
                enabled: true,
                brokers: vec!["localhost:9092".to_string()],
                topic_queries_incoming: topics.queries_incoming,
                topic_analytics: topics.analytics,
            },
            gazetteer: DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("YODA_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("YODA_PORT is not a valid port: {raw}"))?,
            None => defaults.port,
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: {raw}"))?,
            None => defaults.request_timeout_secs,
        };

        let kafka_enabled = match get("KAFKA_ENABLED") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("KAFKA_ENABLED is not a boolean: {raw}"))?,
            None => defaults.kafka.enabled,
        };

        Ok(Self {
            service_name: get("SERVICE_NAME").unwrap_or(defaults.service_name),
            port,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            request_timeout_secs,
            neo4j: GraphStoreConfig {
                uri: get("NEO4J_URI").unwrap_or(defaults.neo4j.uri),
                user: get("NEO4J_USER").unwrap_or(defaults.neo4j.user),
                password: get("NEO4J_PASSWORD").unwrap_or(defaults.neo4j.password),
            },
            llm: LlmConfig {
                api_key: get("GEMINI_API_KEY")
                    .or_else(|| get("GOOGLE_API_KEY"))
                    .unwrap_or_default(),
                model: get("GEMINI_MODEL").unwrap_or(defaults.llm.model),
                base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.llm.base_url),
            },
            kafka: KafkaConfig {
                enabled: kafka_enabled,
                brokers: get("KAFKA_BROKERS")
                    .map(|raw| split_list(&raw))
                    .unwrap_or(defaults.kafka.brokers),
                topic_queries_incoming: get("KAFKA_TOPIC_QUERIES_INCOMING")
                    .unwrap_or(defaults.kafka.topic_queries_incoming),
                topic_analytics: get("KAFKA_TOPIC_ANALYTICS")
                    .unwrap_or(defaults.kafka.topic_analytics),
            },
            gazetteer: get("ENTITY_GAZETTEER")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.gazetteer),
        })
    }

    /// Generation is off when no API key is configured.
    pub fn llm_enabled(&self) -> bool {
        !self.llm.api_key.is_empty()
    }

    /// Publishing is off when disabled or when no broker is listed.
    pub fn events_enabled(&self) -> bool {
        self.kafka.enabled && !self.kafka.brokers.is_empty()
    }

    pub fn neo4j_config(&self) -> Neo4jConfig {
        Neo4jConfig {
            uri: self.neo4j.uri.clone(),
            user: self.neo4j.user.clone(),
            password: self.neo4j.password.clone(),
            ..Neo4jConfig::default()
        }
    }

    pub fn event_topics(&self) -> EventTopics {
        EventTopics {
            queries_incoming: self.kafka.topic_queries_incoming.clone(),
            analytics: self.kafka.topic_analytics.clone(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.kafka.brokers, vec!["localhost:9092"]);
        assert_eq!(config.kafka.topic_analytics, "starwars.analytics");
        assert_eq!(config.gazetteer.len(), DEFAULT_ENTITIES.len());
        assert!(!config.llm_enabled());
        assert!(config.events_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("YODA_PORT", "9090"),
            ("NEO4J_URI", "bolt://graph:7687"),
            ("GEMINI_API_KEY", "secret"),
            ("KAFKA_BROKERS", "k1:9092, k2:9092,"),
            ("ENTITY_GAZETTEER", "Rey,Finn"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.neo4j_config().uri, "bolt://graph:7687");
        assert!(config.llm_enabled());
        assert_eq!(config.kafka.brokers, vec!["k1:9092", "k2:9092"]);
        assert_eq!(config.gazetteer, vec!["Rey", "Finn"]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = from_pairs(&[("YODA_PORT", ""), ("NEO4J_USER", "  ")]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.neo4j.user, "neo4j");
    }

    #[test]
    fn test_google_api_key_fallback() {
        let config = from_pairs(&[("GOOGLE_API_KEY", "g-key")]).unwrap();
        assert_eq!(config.llm.api_key, "g-key");

        let config = from_pairs(&[("GEMINI_API_KEY", "gem"), ("GOOGLE_API_KEY", "g-key")]).unwrap();
        assert_eq!(config.llm.api_key, "gem");
    }

    #[test]
    fn test_kafka_can_be_disabled() {
        let config = from_pairs(&[("KAFKA_ENABLED", "false")]).unwrap();

        assert!(!config.events_enabled());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(from_pairs(&[("YODA_PORT", "eighty")]).is_err());
        assert!(from_pairs(&[("REQUEST_TIMEOUT_SECS", "-1")]).is_err());
        assert!(from_pairs(&[("KAFKA_ENABLED", "maybe")]).is_err());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let config = from_pairs(&[("GEMINI_API_KEY", "secret"), ("NEO4J_PASSWORD", "pw")]).unwrap();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("\"pw\""));
    }
}
