/// System prompt for recipe extraction
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You assist in extracting recipe data from web pages and output in json format.";

/// Instruction the cleaned page text is appended to
pub const EXTRACTION_PROMPT: &str = "Extract the recipe details from the provided text, \
including name/title, description, instructions, ingredients, original_url, featuredImage, \
and category. Category is either breakfast, dinner or baking. \
Ensure all steps and ingredients are fully covered.";

/// Build the user prompt for a page's cleaned text.
pub fn build_extraction_prompt(page_text: &str) -> String {
    format!("{} {}", EXTRACTION_PROMPT, page_text)
}
