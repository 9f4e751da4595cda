use super::{first_image_url, CapturedPage, PageCapture};
use crate::error::RecipeError;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

/// Captures pages with a headless Chrome, so JavaScript-rendered recipes
/// come through.
///
/// A fresh browser process is launched per capture and torn down when the
/// capture returns, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct ChromeFetcher {
    chrome_path: Option<PathBuf>,
    timeout: Duration,
}

impl ChromeFetcher {
    pub fn new(chrome_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            chrome_path,
            timeout,
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, RecipeError> {
        // No sandbox for Linux containers
        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.timeout)
            .args(vec![
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
            ]);

        builder
            .build()
            .map_err(|e| RecipeError::Capture(format!("Invalid launch options: {}", e)))
    }

    /// Blocking capture. `browser` is dropped on every return path, which
    /// kills the Chrome process.
    fn capture_blocking(
        options: LaunchOptions<'static>,
        timeout: Duration,
        url: &str,
    ) -> Result<String, RecipeError> {
        let browser = Browser::new(options)
            .map_err(|e| RecipeError::Capture(format!("Failed to launch browser: {}", e)))?;
        debug!("Browser launched for {}", url);

        let tab = browser
            .new_tab()
            .map_err(|e| RecipeError::Capture(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(timeout);

        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| RecipeError::Capture(format!("Failed to load {}: {}", url, e)))?;

        tab.get_content()
            .map_err(|e| RecipeError::Capture(format!("Failed to read DOM: {}", e)))
    }
}

#[async_trait]
impl PageCapture for ChromeFetcher {
    async fn capture(&self, url: &str) -> Result<CapturedPage, RecipeError> {
        let options = self.launch_options()?;
        let timeout = self.timeout;
        let page_url = url.to_string();

        let task = tokio::task::spawn_blocking(move || {
            Self::capture_blocking(options, timeout, &page_url)
        });

        // Navigation and DOM reads are each bounded by `timeout`; allow both
        // plus launch before giving up on the whole capture.
        let html = tokio::time::timeout(timeout * 3, task)
            .await
            .map_err(|_| RecipeError::Capture(format!("Timed out capturing {}", url)))?
            .map_err(|e| RecipeError::Capture(format!("Capture task failed: {}", e)))??;

        let image_url = first_image_url(&html, url);
        if image_url.is_none() {
            debug!("No image found on {}", url);
        }

        Ok(CapturedPage { html, image_url })
    }
}
