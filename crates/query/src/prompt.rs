use std::borrow::Cow;

use graph::GraphContext;

/// Longest `wiki_description` rendered before truncation, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

const SYSTEM_FRAMING: &str = "You are a Star Wars expert assistant. \
Answer the question using ONLY the provided knowledge graph.";

/// Render the graph context and question into the LLM prompt.
///
/// Nodes are listed in context order, duplicates included. The prompt ends
/// with a bare `Answer:` cue for the model to complete.
pub fn build_prompt(question: &str, context: &GraphContext) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_FRAMING);
    prompt.push_str("\n\n");

    if !context.nodes.is_empty() {
        prompt.push_str("## Available Entities:\n");
        for node in &context.nodes {
            prompt.push_str(&format!("- **{}** ({})\n", node.name, node.label));

            if let Some(desc) = node.wiki_description() {
                prompt.push_str(&format!("  Description: {}\n", truncate_description(desc)));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("## Question:\n{}\n\n", question));

    prompt.push_str("## Instructions:\n");
    prompt.push_str("- Answer based ONLY on the entities listed above\n");
    prompt.push_str("- Cite specific entities in your answer\n");
    prompt.push_str("- If information is insufficient, state that clearly\n");
    prompt.push_str("- Be concise but informative\n\n");
    prompt.push_str("Answer:");

    prompt
}

fn truncate_description(desc: &str) -> Cow<'_, str> {
    match desc.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &desc[..cut])),
        None => Cow::Borrowed(desc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::Node;

    fn yoda_context() -> GraphContext {
        GraphContext {
            nodes: vec![
                Node::new("1", "Character", "Yoda")
                    .with_property("wiki_description", "Grand Master of the Jedi Order."),
                Node::new("2", "Planet", "Dagobah"),
            ],
            relationships: vec![],
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt("Who is Yoda?", &yoda_context());

        let expected = "You are a Star Wars expert assistant. Answer the question using ONLY the provided knowledge graph.\n\
\n\
## Available Entities:\n\
- **Yoda** (Character)\n\
\x20 Description: Grand Master of the Jedi Order.\n\
- **Dagobah** (Planet)\n\
\n\
## Question:\n\
Who is Yoda?\n\
\n\
## Instructions:\n\
- Answer based ONLY on the entities listed above\n\
- Cite specific entities in your answer\n\
- If information is insufficient, state that clearly\n\
- Be concise but informative\n\
\n\
Answer:";

        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_empty_context_has_no_entity_section() {
        let prompt = build_prompt("Who is Rey?", &GraphContext::default());

        assert!(!prompt.contains("## Available Entities:"));
        assert!(prompt.contains("## Question:\nWho is Rey?\n\n"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_deterministic() {
        let ctx = yoda_context();

        assert_eq!(build_prompt("q", &ctx), build_prompt("q", &ctx));
    }

    #[test]
    fn test_long_description_truncated() {
        let long = "a".repeat(250);
        let ctx = GraphContext {
            nodes: vec![Node::new("1", "Character", "Yoda").with_property("wiki_description", long)],
            relationships: vec![],
        };

        let prompt = build_prompt("q", &ctx);

        let expected_line = format!("  Description: {}...\n", "a".repeat(200));
        assert!(prompt.contains(&expected_line));
        assert!(!prompt.contains(&"a".repeat(201)));
    }

    #[test]
    fn test_description_at_limit_untouched() {
        let exact = "é".repeat(200);
        assert_eq!(truncate_description(&exact), exact.as_str());

        let over = "é".repeat(201);
        assert_eq!(truncate_description(&over), format!("{}...", "é".repeat(200)));
    }

    #[test]
    fn test_non_string_description_ignored() {
        let ctx = GraphContext {
            nodes: vec![Node::new("1", "Character", "Yoda").with_property("wiki_description", 900)],
            relationships: vec![],
        };

        assert!(!build_prompt("q", &ctx).contains("Description:"));
    }

    #[test]
    fn test_duplicate_nodes_rendered_twice() {
        let ctx = GraphContext {
            nodes: vec![
                Node::new("1", "Character", "Yoda"),
                Node::new("1", "Character", "Yoda"),
            ],
            relationships: vec![],
        };

        assert_eq!(build_prompt("q", &ctx).matches("- **Yoda** (Character)").count(), 2);
    }
}
