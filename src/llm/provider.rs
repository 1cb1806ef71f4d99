// src/llm/provider.rs
// Model client trait used by the interaction shell

use async_trait::async_trait;

use crate::error::ProviderError;

/// Capability a model must advertise to be usable for analysis
pub const GENERATE_CONTENT: &str = "generateContent";

/// Trait for hosted model clients.
///
/// Credentials are passed on every call; implementations hold no key.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one analysis request and return the completion text unmodified.
    ///
    /// `system_prompt` rides along as the model's system instruction and the
    /// user message is `prompt::user_message(user_text)`.
    async fn analyze(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError>;

    /// Names of models supporting `GENERATE_CONTENT`, in provider order
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError>;

    /// Model identifier used for `analyze`
    fn model_name(&self) -> String;
}
