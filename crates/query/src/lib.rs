pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use llm::{AnswerGenerator, GeminiClient, GenerationError};
pub use pipeline::{PipelineError, QueryPipeline, QueryResponse};
pub use prompt::build_prompt;
