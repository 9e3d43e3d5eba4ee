use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A graph vertex surfaced in a context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            name: name.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `wiki_description` property, when it is a non-empty string.
    pub fn wiki_description(&self) -> Option<&str> {
        self.properties
            .get("wiki_description")
            .and_then(Value::as_str)
            .filter(|desc| !desc.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub source: String,
    pub target: String,
}

/// Nodes and relationships gathered for a single question.
///
/// Nodes keep store order and may repeat when the same vertex was reached
/// along several paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphContext {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

impl GraphContext {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    /// Distinct node names in first-seen order.
    pub fn source_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            if seen.insert(node.name.as_str()) {
                sources.push(node.name.clone());
            }
        }

        sources
    }

    /// Distinct non-empty node ids in first-seen order.
    pub fn node_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();

        self.nodes
            .iter()
            .filter(|n| !n.id.is_empty() && seen.insert(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_names_dedup_first_seen() {
        let ctx = GraphContext {
            nodes: vec![
                Node::new("1", "Character", "Yoda"),
                Node::new("2", "Character", "Luke Skywalker"),
                Node::new("1", "Character", "Yoda"),
            ],
            relationships: vec![],
        };

        assert_eq!(ctx.source_names(), vec!["Yoda", "Luke Skywalker"]);
        assert_eq!(ctx.node_ids(), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_context() {
        let ctx = GraphContext::default();

        assert!(ctx.is_empty());
        assert!(ctx.source_names().is_empty());
    }

    #[test]
    fn test_node_serialization_keeps_property_types() {
        let node = Node::new("7", "Planet", "Hoth")
            .with_property("climate", "frozen")
            .with_property("population", 0)
            .with_property("habitable", false)
            .with_property("coords", json!({"x": 1.5, "y": -2}));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "7",
                "label": "Planet",
                "name": "Hoth",
                "properties": {
                    "climate": "frozen",
                    "population": 0,
                    "habitable": false,
                    "coords": {"x": 1.5, "y": -2}
                }
            })
        );

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_empty_properties_omitted() {
        let value = serde_json::to_value(Node::new("1", "Character", "Yoda")).unwrap();
        assert!(value.get("properties").is_none());

        let rel = Relationship {
            rel_type: "TRAINED".to_string(),
            source: "1".to_string(),
            target: "2".to_string(),
        };
        assert_eq!(
            serde_json::to_value(rel).unwrap(),
            json!({"type": "TRAINED", "source": "1", "target": "2"})
        );
    }

    #[test]
    fn test_wiki_description_requires_non_empty_string() {
        let node = Node::new("1", "Character", "Yoda").with_property("wiki_description", "");
        assert_eq!(node.wiki_description(), None);

        let node = Node::new("1", "Character", "Yoda").with_property("wiki_description", 42);
        assert_eq!(node.wiki_description(), None);

        let node = Node::new("1", "Character", "Yoda").with_property("wiki_description", "Jedi");
        assert_eq!(node.wiki_description(), Some("Jedi"));
    }
}
