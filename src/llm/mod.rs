// src/llm/mod.rs
// Model client abstraction and the Gemini implementation

pub mod gemini;
pub mod http;
pub mod provider;

pub use gemini::GeminiClient;
pub use provider::{GENERATE_CONTENT, ModelClient};
