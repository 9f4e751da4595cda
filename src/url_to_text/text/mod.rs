mod extractor;

pub use extractor::TextExtractor;
