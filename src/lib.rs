// src/lib.rs
// CSL-Metrix: Chinese L2 writing complexity analysis delegated to Gemini

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod sanitize;
pub mod shell;

pub use analysis::{AnalysisReport, AnalysisResponse, RenderOutcome, interpret};
pub use error::{ConfigError, ProviderError, ValidationError};
pub use llm::{GeminiClient, ModelClient};
pub use sanitize::sanitize;
pub use shell::{AnalysisOutcome, ModelsOutcome, Phase, Session, Shell};
