#![allow(dead_code)]

use async_trait::async_trait;
use recipe_saver::model::{Category, CompletionResult, RecipePayload, Usage};
use recipe_saver::providers::StructuredCompletion;
use recipe_saver::storage::MemoryStore;
use recipe_saver::url_to_text::fetchers::{CapturedPage, PageCapture};
use recipe_saver::{RecipeError, RecipeService};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const PUBLIC_BASE_URL: &str = "https://img.example.com";

/// Serves canned HTML per URL; unknown URLs fail like an unreachable page
#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, CapturedPage>,
}

impl FakeBrowser {
    pub fn with_page(mut self, url: &str, html: &str, image_url: Option<String>) -> Self {
        self.pages.insert(
            url.to_string(),
            CapturedPage {
                html: html.to_string(),
                image_url,
            },
        );
        self
    }
}

#[async_trait]
impl PageCapture for FakeBrowser {
    async fn capture(&self, url: &str) -> Result<CapturedPage, RecipeError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RecipeError::Capture(format!("Failed to load {}", url)))
    }
}

/// Hands out queued payloads in order, one per completion call
#[derive(Default)]
pub struct ScriptedCompletion {
    payloads: Mutex<VecDeque<RecipePayload>>,
}

impl ScriptedCompletion {
    pub fn new(payloads: Vec<RecipePayload>) -> Self {
        Self {
            payloads: Mutex::new(payloads.into()),
        }
    }
}

#[async_trait]
impl StructuredCompletion for ScriptedCompletion {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        _max_tokens: u32,
    ) -> Result<CompletionResult, RecipeError> {
        let recipe = self
            .payloads
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RecipeError::Completion("no scripted payload left".to_string()))?;
        Ok(CompletionResult {
            id: "chatcmpl-test".to_string(),
            model: "gpt-4o-mini-2024-07-18".to_string(),
            usage: Usage::default(),
            recipe,
        })
    }
}

pub fn payload(title: &str, category: Category) -> RecipePayload {
    RecipePayload {
        title: title.to_string(),
        description: format!("A short note about {}", title),
        category,
        prep_time: 10,
        cook_time: 20,
        total_time: 30,
        servings: 4,
        ingredients: vec!["2 eggs".to_string(), "1 cup flour".to_string()],
        instructions: vec!["Mix".to_string(), "Cook".to_string()],
    }
}

pub fn recipe_page(title: &str) -> String {
    format!(
        "<html><head><script>track()</script></head>\
         <body><h1>{}</h1><ul><li>2 eggs</li><li>1 cup flour</li></ul>\
         <p>Mix, then cook.</p></body></html>",
        title
    )
}

pub fn service(
    browser: FakeBrowser,
    payloads: Vec<RecipePayload>,
    store: Arc<MemoryStore>,
) -> RecipeService {
    RecipeService::builder()
        .capture(browser)
        .completion(ScriptedCompletion::new(payloads))
        .store(store)
        .public_base_url(PUBLIC_BASE_URL)
        .build()
        .unwrap()
}
