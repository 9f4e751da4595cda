use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recipe category. The only accepted values are breakfast, dinner and baking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Dinner,
    Baking,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Breakfast, Category::Dinner, Category::Baking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Dinner => "dinner",
            Category::Baking => "baking",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Category::Breakfast),
            "dinner" => Ok(Category::Dinner),
            "baking" => Ok(Category::Baking),
            other => Err(format!(
                "unknown category '{}', expected breakfast, dinner or baking",
                other
            )),
        }
    }
}

// Models are not always consistent about casing ("Dinner" vs "dinner").
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical persisted recipe.
///
/// `link` and `image` are always derived by the save pipeline, never taken
/// from the model output or the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub category: Category,
    #[serde(rename = "cookTime")]
    pub cook_time: u32,
    pub date: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(rename = "prepTime")]
    pub prep_time: u32,
    pub servings: u32,
    pub title: String,
    #[serde(rename = "totalTime")]
    pub total_time: u32,
    pub link: String,
    #[serde(rename = "originalURL")]
    pub original_url: String,
}

/// Token accounting reported by the completion endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Recipe-shaped payload the model emits under the response schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipePayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(rename = "prepTime", default)]
    pub prep_time: u32,
    #[serde(rename = "cookTime", default)]
    pub cook_time: u32,
    #[serde(rename = "totalTime", default)]
    pub total_time: u32,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

fn default_servings() -> u32 {
    1
}

/// Result of one structured completion call. Consumed immediately to build
/// a [`Recipe`] and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub id: String,
    pub model: String,
    pub usage: Usage,
    pub recipe: RecipePayload,
}

/// Normalize a recipe title into a filename and URL safe slug.
///
/// Whitespace runs become a single hyphen; anything outside ASCII
/// alphanumerics, `-` and `_` is dropped.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            category: Category::Dinner,
            cook_time: 30,
            date: "2024-05-01T12:00:00+00:00".to_string(),
            image: "https://img.example.com/images/lasagna.jpg".to_string(),
            ingredients: vec!["pasta".to_string(), "sauce".to_string()],
            instructions: vec!["Layer".to_string(), "Bake".to_string()],
            prep_time: 15,
            servings: 4,
            title: "Lasagna".to_string(),
            total_time: 45,
            link: "/recipes/dinner/lasagna".to_string(),
            original_url: "https://example.com/lasagna".to_string(),
        }
    }

    #[test]
    fn test_recipe_json_field_names() {
        let value = serde_json::to_value(sample_recipe()).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "category",
                "cookTime",
                "date",
                "image",
                "ingredients",
                "instructions",
                "link",
                "originalURL",
                "prepTime",
                "servings",
                "title",
                "totalTime",
            ]
        );
        assert_eq!(object["category"], "dinner");
        assert_eq!(object["originalURL"], "https://example.com/lasagna");
    }

    #[test]
    fn test_category_is_case_insensitive() {
        let category: Category = serde_json::from_str("\"Baking\"").unwrap();
        assert_eq!(category, Category::Baking);
        assert_eq!(" BREAKFAST ".parse::<Category>().unwrap(), Category::Breakfast);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result = serde_json::from_str::<Category>("\"dessert\"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown category"));
    }

    #[test]
    fn test_payload_defaults() {
        let payload: RecipePayload =
            serde_json::from_str(r#"{"title": "Toast", "category": "breakfast"}"#).unwrap();
        assert_eq!(payload.servings, 1);
        assert!(payload.ingredients.is_empty());
        assert!(payload.instructions.is_empty());
        assert_eq!(payload.total_time, 0);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Chocolate Chip Cookies"), "chocolate-chip-cookies");
        assert_eq!(slugify("  Mom's   Apple Pie "), "moms-apple-pie");
        assert_eq!(slugify("Crème Brûlée / Easy"), "crme-brle-easy");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slugify_is_stable() {
        let title = "One-Pot Chicken Curry";
        assert_eq!(slugify(title), slugify(title));
        assert_eq!(slugify(title), "one-pot-chicken-curry");
    }
}
