mod chrome;
mod request;

pub use chrome::ChromeFetcher;
pub use request::RequestFetcher;

use crate::error::RecipeError;
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};

/// Rendered page and its hero image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPage {
    pub html: String,
    /// Absolute URL of the first image on the page, if there is one
    pub image_url: Option<String>,
}

/// Loads a URL and yields its HTML. Every call is independent.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str) -> Result<CapturedPage, RecipeError>;
}

/// `src` of the first `<img>` in the document, resolved against `page_url`.
///
/// Lazy-loading pages often put a placeholder `data:` URI in `src` and the
/// real location in `data-src`.
pub fn first_image_url(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").ok()?;
    let img = document.select(&selector).next()?;

    let usable = |value: &&str| !value.trim().is_empty() && !value.starts_with("data:");
    let src = img
        .value()
        .attr("src")
        .filter(usable)
        .or_else(|| img.value().attr("data-src").filter(usable))?
        .trim();

    match Url::parse(src) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(page_url)
            .and_then(|base| base.join(src))
            .ok()
            .map(|url| url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_absolute() {
        let html = r#"<html><body>
            <img src="https://cdn.example.com/hero.jpg">
            <img src="https://cdn.example.com/second.jpg">
        </body></html>"#;
        assert_eq!(
            first_image_url(html, "https://example.com/recipe").as_deref(),
            Some("https://cdn.example.com/hero.jpg")
        );
    }

    #[test]
    fn test_first_image_relative() {
        let html = r#"<img src="/uploads/pie.jpg">"#;
        assert_eq!(
            first_image_url(html, "https://example.com/recipes/pie").as_deref(),
            Some("https://example.com/uploads/pie.jpg")
        );
    }

    #[test]
    fn test_lazy_loaded_image() {
        let html = r#"<img src="data:image/gif;base64,R0lGOD" data-src="https://example.com/real.jpg">"#;
        assert_eq!(
            first_image_url(html, "https://example.com").as_deref(),
            Some("https://example.com/real.jpg")
        );
    }

    #[test]
    fn test_no_image() {
        assert_eq!(first_image_url("<p>No pictures</p>", "https://example.com"), None);
        assert_eq!(first_image_url("<img alt=\"empty\">", "https://example.com"), None);
    }
}
