pub mod fetchers;
pub mod text;
