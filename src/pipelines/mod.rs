pub mod url;

pub use url::{RecipeAssembler, SavedRecipe, Stage, DEFAULT_MAX_TOKENS};
