use crate::error::RecipeError;
use scraper::{ElementRef, Html, Node};

/// Turns captured HTML into prose suitable for prompting.
///
/// Script, style and other non-content subtrees are dropped entirely; the
/// remaining text nodes are flattened in document order with one line per
/// block element.
pub struct TextExtractor;

impl TextExtractor {
    pub fn extract(html: &str) -> Result<String, RecipeError> {
        let document = Html::parse_document(html);
        let text = extract_inner_texts(&document).join("\n");
        let text = text.trim();

        // html5ever recovers from any markup, so "unparseable" means nothing
        // survived to be read
        if text.is_empty() {
            return Err(RecipeError::Parse(
                "document contains no readable text".to_string(),
            ));
        }

        Ok(text.to_string())
    }
}

fn extract_inner_texts(document: &Html) -> Vec<String> {
    let mut result = Vec::new();
    let root = document.root_element();
    extract_text_from_element(&root, &mut result);

    // Merge text between block markers
    let mut processed = Vec::new();
    let mut current_block = Vec::new();

    for text in result {
        match text {
            Chunk::BlockBreak => flush_block(&mut current_block, &mut processed),
            Chunk::Text(text) => current_block.push(text),
        }
    }
    flush_block(&mut current_block, &mut processed);

    processed
}

enum Chunk {
    Text(String),
    BlockBreak,
}

fn flush_block(current_block: &mut Vec<String>, processed: &mut Vec<String>) {
    if current_block.is_empty() {
        return;
    }
    let merged = current_block.join(" ").trim().to_string();
    if !merged.is_empty() {
        processed.push(merged);
    }
    current_block.clear();
}

fn extract_text_from_element(element: &ElementRef, result: &mut Vec<Chunk>) {
    if is_hidden(element) || should_skip_element(element) {
        return;
    }

    let tag_name = element.value().name().to_lowercase();

    if tag_name == "br" {
        result.push(Chunk::BlockBreak);
        return;
    }

    if is_block_element(&tag_name) {
        result.push(Chunk::BlockBreak);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = normalize_whitespace(text);
                if !trimmed.is_empty() {
                    result.push(Chunk::Text(trimmed));
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    extract_text_from_element(&child_ref, result);
                }
            }
            _ => {}
        }
    }

    if is_block_element(&tag_name) {
        result.push(Chunk::BlockBreak);
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    element.value().attr("hidden").is_some()
        || element
            .value()
            .attr("style")
            .map(|s| {
                let s = s.replace(' ', "");
                s.contains("display:none") || s.contains("visibility:hidden")
            })
            .unwrap_or(false)
}

fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "tfoot"
            | "tr"
            | "ul"
    )
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn should_skip_element(element: &ElementRef) -> bool {
    let tag_name = element.value().name().to_lowercase();
    matches!(
        tag_name.as_str(),
        "script" | "style" | "noscript" | "template" | "iframe" | "canvas" | "svg"
    )
}
