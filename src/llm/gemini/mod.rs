// src/llm/gemini/mod.rs
// Google Gemini REST client (generateContent + models listing)

mod client;
pub mod types;

pub use client::{DEFAULT_API_BASE, DEFAULT_MODEL, GeminiClient, model_path};
