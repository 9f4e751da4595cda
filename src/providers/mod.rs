mod open_ai;
mod prompt;
mod schema;

pub use open_ai::OpenAIProvider;
pub use prompt::{build_extraction_prompt, EXTRACTION_PROMPT, EXTRACTION_SYSTEM_PROMPT};
pub use schema::ResponseSchema;

use crate::error::RecipeError;
use crate::model::CompletionResult;
use async_trait::async_trait;

/// LLM chat completion constrained to a response JSON schema
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Send one request; no retries, no streaming.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        max_tokens: u32,
    ) -> Result<CompletionResult, RecipeError>;
}
