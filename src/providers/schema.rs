use crate::error::RecipeError;
use serde_json::Value;
use std::path::Path;

const DEFAULT_SCHEMA_NAME: &str = "recipe_response";

/// JSON schema the model output must validate against.
///
/// Loaded once at start-up and handed to the completion client; never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    name: String,
    schema: Value,
}

impl ResponseSchema {
    /// Read a schema file. Accepts either `{"name", "schema"}` or a bare
    /// schema object.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| RecipeError::Schema(format!("{}: {}", path.display(), e)))?;
        let value: Value = serde_json::from_str(&data)
            .map_err(|e| RecipeError::Schema(format!("{}: {}", path.display(), e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RecipeError> {
        let Value::Object(mut object) = value else {
            return Err(RecipeError::Schema("schema must be a JSON object".to_string()));
        };

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SCHEMA_NAME)
            .to_string();

        let schema = match object.remove("schema") {
            Some(schema @ Value::Object(_)) => schema,
            Some(_) => {
                return Err(RecipeError::Schema(
                    "\"schema\" must be a JSON object".to_string(),
                ))
            }
            None => Value::Object(object),
        };

        Ok(Self { name, schema })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }
}
