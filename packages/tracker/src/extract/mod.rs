//! Semantic extractor implementations.

pub mod openai;

pub use openai::OpenAiExtractor;
