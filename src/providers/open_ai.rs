use crate::config::OpenAiConfig;
use crate::error::RecipeError;
use crate::model::{CompletionResult, RecipePayload, Usage};
use crate::providers::{ResponseSchema, StructuredCompletion};
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    schema: ResponseSchema,
    debug: bool,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration and a loaded schema
    pub fn new(config: &OpenAiConfig, schema: ResponseSchema) -> Result<Self, RecipeError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            RecipeError::Builder(
                "OPENAI_API_KEY not found in config or environment".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RecipeError::Builder(format!("Failed to create HTTP client: {}", e)))?;

        Ok(OpenAIProvider {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            schema,
            debug: config.debug,
        })
    }

    /// Create a new OpenAI provider with simple parameters
    pub fn with_api_key(api_key: String, model: String, schema: ResponseSchema) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), model, schema)
    }

    #[doc(hidden)]
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        model: String,
        schema: ResponseSchema,
    ) -> Self {
        OpenAIProvider {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url,
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
            schema,
            debug: false,
        }
    }

    /// Log full request and response bodies
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn request_body(&self, prompt: &str, system_prompt: &str, max_tokens: u32) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": max_tokens,
            "temperature": 0,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": self.schema.name(),
                    "schema": self.schema.schema(),
                    "strict": true
                }
            }
        })
    }
}

#[async_trait]
impl StructuredCompletion for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        max_tokens: u32,
    ) -> Result<CompletionResult, RecipeError> {
        let body = self.request_body(prompt, system_prompt, max_tokens);
        if self.debug {
            info!("Request: {}", body);
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| RecipeError::Completion(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RecipeError::Completion(e.to_string()))?;
        if self.debug {
            info!("Response: {}", text);
        }

        if !status.is_success() {
            return Err(RecipeError::Completion(format!(
                "{} returned {}: {}",
                self.provider_name(),
                status,
                upstream_message(&text)
            )));
        }

        let response: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| RecipeError::Completion(format!("Malformed response: {}", e)))?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| RecipeError::Completion("Response has no choices".to_string()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(RecipeError::Completion(format!("Model refused: {}", refusal)));
        }

        let content = message
            .content
            .ok_or_else(|| RecipeError::Completion("Response has no content".to_string()))?;

        let recipe: RecipePayload = serde_json::from_str(&content).map_err(|e| {
            RecipeError::Completion(format!("Output does not match schema: {}", e))
        })?;

        Ok(CompletionResult {
            id: response.id,
            model: response.model,
            usage: response.usage,
            recipe,
        })
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw text
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use mockito::{Matcher, Server};

    fn schema() -> ResponseSchema {
        ResponseSchema::from_value(json!({
            "name": "recipe_response",
            "schema": {"type": "object", "additionalProperties": false}
        }))
        .unwrap()
    }

    fn completion_body(content: &str) -> String {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = Server::new_async().await;
        let content = json!({
            "title": "Banana Bread",
            "description": "Moist and simple",
            "category": "baking",
            "prepTime": 10,
            "cookTime": 60,
            "totalTime": 70,
            "servings": 8,
            "ingredients": ["3 bananas", "2 cups flour"],
            "instructions": ["Mash bananas", "Bake"]
        })
        .to_string();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer fake_api_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(&content))
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
            schema(),
        );

        let result = provider.complete("text", "system", 1000).await.unwrap();
        assert_eq!(result.id, "chatcmpl-123");
        assert_eq!(result.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(result.usage.total_tokens, 200);
        assert_eq!(result.recipe.title, "Banana Bread");
        assert_eq!(result.recipe.category, Category::Baking);
        assert_eq!(result.recipe.ingredients.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_is_deterministic_and_schema_constrained() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0,
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "system prompt"},
                    {"role": "user", "content": "user prompt"}
                ],
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "recipe_response", "strict": true}
                }
            })))
            .with_status(200)
            .with_body(completion_body(
                r#"{"title": "Eggs", "category": "breakfast"}"#,
            ))
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
            schema(),
        );

        provider
            .complete("user prompt", "system prompt", 512)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Invalid schema for response_format"}}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
            schema(),
        );

        let err = provider.complete("text", "system", 100).await.unwrap_err();
        assert!(matches!(err, RecipeError::Completion(_)));
        assert!(err.to_string().contains("Invalid schema for response_format"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_content_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion_body("this is not json"))
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
            schema(),
        );

        let err = provider.complete("text", "system", 100).await.unwrap_err();
        assert!(err.to_string().contains("does not match schema"));
    }

    #[tokio::test]
    async fn test_unknown_category_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion_body(r#"{"title": "Soup", "category": "lunch"}"#))
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
            schema(),
        );

        let result = provider.complete("text", "system", 100).await;
        assert!(matches!(result, Err(RecipeError::Completion(_))));
    }

    #[tokio::test]
    async fn test_provider_name() {
        let provider =
            OpenAIProvider::with_api_key("fake_api_key".to_string(), "gpt-4".to_string(), schema());
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_upstream_message() {
        assert_eq!(
            upstream_message(r#"{"error": {"message": "quota exceeded"}}"#),
            "quota exceeded"
        );
        assert_eq!(upstream_message(r#"{"error": "Invalid request"}"#), "Invalid request");
        assert_eq!(upstream_message("Bad Gateway"), "Bad Gateway");
    }
}
