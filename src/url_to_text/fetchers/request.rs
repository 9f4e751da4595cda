use super::{first_image_url, CapturedPage, PageCapture};
use crate::error::RecipeError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// Largest hero image accepted by default
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Plain HTTP fetches: pages without JavaScript rendering, and image bytes.
#[derive(Debug, Clone)]
pub struct RequestFetcher {
    client: Client,
    max_image_bytes: usize,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, RecipeError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; RecipeSaver/1.0)")
            .build()
            .map_err(|e| RecipeError::Builder(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        })
    }

    /// Refuse images larger than `max` bytes
    pub fn with_max_image_bytes(mut self, max: usize) -> Self {
        self.max_image_bytes = max;
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<String, RecipeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecipeError::Capture(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RecipeError::Capture(format!(
                "{} returned status: {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| RecipeError::Capture(e.to_string()))
    }

    /// Download image bytes. Any non-2xx status is an error, as is a body
    /// over the size limit.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RecipeError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecipeError::ImageFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RecipeError::ImageFetch(format!(
                "Failed to download image: {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_image_bytes as u64 {
                return Err(self.too_large(url));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RecipeError::ImageFetch(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_image_bytes {
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    fn too_large(&self, url: &str) -> RecipeError {
        RecipeError::ImageFetch(format!(
            "{} is larger than {} bytes",
            url, self.max_image_bytes
        ))
    }
}

#[async_trait]
impl PageCapture for RequestFetcher {
    async fn capture(&self, url: &str) -> Result<CapturedPage, RecipeError> {
        let html = self.fetch(url).await?;
        let image_url = first_image_url(&html, url);
        Ok(CapturedPage { html, image_url })
    }
}
