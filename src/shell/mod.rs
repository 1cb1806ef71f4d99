// src/shell/mod.rs
// Interaction shell: one session record driven through
// Idle -> Validating -> Requesting -> Rendering -> Idle

pub mod repl;

use tracing::{debug, warn};

use crate::analysis::{RenderOutcome, interpret};
use crate::error::{ProviderError, ValidationError};
use crate::llm::ModelClient;
use crate::prompt::SYSTEM_PROMPT;
use crate::render::{self, theme};

/// Where the shell is in handling one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Requesting,
    Rendering,
}

/// Result of one analysis trigger
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Rejected before any network call
    Invalid(ValidationError),
    /// Provider call failed; nothing was rendered
    Failed(ProviderError),
    /// Reply interpreted, either as a dashboard or as the raw fallback
    Rendered(RenderOutcome),
}

impl AnalysisOutcome {
    /// True when the reply reached the renderer
    pub fn is_rendered(&self) -> bool {
        matches!(self, AnalysisOutcome::Rendered(_))
    }

    /// User-facing text for this outcome
    pub fn display(&self, show_raw: bool) -> String {
        match self {
            AnalysisOutcome::Invalid(ValidationError::MissingApiKey) => {
                format!("{}\n", theme::error(&ValidationError::MissingApiKey.to_string()))
            }
            AnalysisOutcome::Invalid(err) => format!("{}\n", theme::warning(&err.to_string())),
            AnalysisOutcome::Failed(err) => {
                format!("{}\n", theme::error(&format!("连接出错: {}", err)))
            }
            AnalysisOutcome::Rendered(outcome) => render::render_outcome(outcome, show_raw),
        }
    }
}

/// Result of one model-listing trigger
#[derive(Debug, Clone, PartialEq)]
pub enum ModelsOutcome {
    Invalid(ValidationError),
    Failed(ProviderError),
    /// Usable model names in provider order; may be empty
    Listed(Vec<String>),
}

impl ModelsOutcome {
    /// True when at least one usable model was listed
    pub fn has_models(&self) -> bool {
        matches!(self, ModelsOutcome::Listed(names) if !names.is_empty())
    }

    pub fn display(&self) -> String {
        match self {
            ModelsOutcome::Invalid(err) => format!("{}\n", theme::error(&err.to_string())),
            ModelsOutcome::Failed(err) => {
                format!("{}\n", theme::error(&format!("查询失败: {}", err)))
            }
            ModelsOutcome::Listed(names) => render::render_models(names),
        }
    }
}

/// The only mutable state the shell keeps, in memory only
#[derive(Debug, Default)]
pub struct Session {
    pub api_key: Option<String>,
    pub last_text: Option<String>,
    pub last_outcome: Option<AnalysisOutcome>,
}

/// Check the key for a trigger. Blank keys count as missing.
pub fn validate_key(api_key: Option<&str>) -> Result<&str, ValidationError> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ValidationError::MissingApiKey),
    }
}

/// Check both inputs of an analysis trigger, key first
pub fn validate_request<'a>(
    api_key: Option<&'a str>,
    text: &str,
) -> Result<&'a str, ValidationError> {
    let key = validate_key(api_key)?;
    if text.trim().is_empty() {
        return Err(ValidationError::MissingText);
    }
    Ok(key)
}

pub struct Shell<C: ModelClient> {
    client: C,
    session: Session,
    phase: Phase,
}

impl<C: ModelClient> Shell<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            session: Session::default(),
            phase: Phase::Idle,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.set_api_key(api_key);
        self
    }

    /// Replace the session key; blank input clears it
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.session.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn enter(&mut self, phase: Phase, on_phase: &mut impl FnMut(Phase)) {
        debug!(from = ?self.phase, to = ?phase, "Shell transition");
        self.phase = phase;
        on_phase(phase);
    }

    /// Run one analysis trigger to completion and record it in the session.
    ///
    /// `on_phase` sees every transition, which lets the front end show a busy
    /// indicator while `Requesting`. The shell is `Idle` again on return.
    pub async fn analyze(
        &mut self,
        text: &str,
        mut on_phase: impl FnMut(Phase),
    ) -> AnalysisOutcome {
        self.enter(Phase::Validating, &mut on_phase);
        self.session.last_text = Some(text.to_string());

        let outcome = match validate_request(self.session.api_key.as_deref(), text) {
            Err(err) => {
                debug!(error = %err, "Analysis rejected by validation");
                AnalysisOutcome::Invalid(err)
            }
            Ok(key) => {
                let key = key.to_string();
                self.enter(Phase::Requesting, &mut on_phase);
                match self.client.analyze(&key, SYSTEM_PROMPT, text).await {
                    Err(err) => {
                        warn!(error = %err, "Analysis request failed");
                        AnalysisOutcome::Failed(err)
                    }
                    Ok(raw) => {
                        self.enter(Phase::Rendering, &mut on_phase);
                        let rendered = interpret(&raw);
                        if let RenderOutcome::Fallback { reason, .. } = &rendered {
                            warn!(reason = %reason, "Reply could not be parsed, showing raw text");
                        }
                        AnalysisOutcome::Rendered(rendered)
                    }
                }
            }
        };

        self.enter(Phase::Idle, &mut on_phase);
        self.session.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Debug sub-flow: list usable models for the session key.
    /// Does not touch the analysis fields of the session.
    pub async fn list_models(&mut self) -> ModelsOutcome {
        let key = match validate_key(self.session.api_key.as_deref()) {
            Ok(key) => key.to_string(),
            Err(err) => return ModelsOutcome::Invalid(err),
        };
        match self.client.list_models(&key).await {
            Ok(names) => {
                if names.is_empty() {
                    warn!("No models with generateContent for this key");
                }
                ModelsOutcome::Listed(names)
            }
            Err(err) => {
                warn!(error = %err, "Model listing failed");
                ModelsOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted client counting calls
    struct ScriptedClient {
        reply: Result<String, ProviderError>,
        models: Result<Vec<String>, ProviderError>,
        calls: AtomicUsize,
        last_key: Mutex<Option<String>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                models: Ok(vec![]),
                calls: AtomicUsize::new(0),
                last_key: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(ProviderError::new(message)),
                models: Err(ProviderError::new(message)),
                calls: AtomicUsize::new(0),
                last_key: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn analyze(
            &self,
            api_key: &str,
            _system_prompt: &str,
            _user_text: &str,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_key.lock().unwrap() = Some(api_key.to_string());
            self.reply.clone()
        }

        async fn list_models(&self, _api_key: &str) -> Result<Vec<String>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.models.clone()
        }

        fn model_name(&self) -> String {
            "scripted".to_string()
        }
    }

    const VALID_REPLY: &str = r#"{"summary": "好", "basic_stats": {"words": 12},
        "scores": {"narrativity": 80, "semantic_similarity": 0.5},
        "readability": {"hsk_level": "HSK4", "score": 60}, "details": "ok"}"#;

    #[test]
    fn test_validate_request() {
        assert_eq!(validate_request(None, "文本"), Err(ValidationError::MissingApiKey));
        assert_eq!(validate_request(Some(" \t"), "文本"), Err(ValidationError::MissingApiKey));
        assert_eq!(validate_request(Some("k"), ""), Err(ValidationError::MissingText));
        assert_eq!(validate_request(Some("k"), "  \n"), Err(ValidationError::MissingText));
        assert_eq!(validate_request(None, ""), Err(ValidationError::MissingApiKey));
        assert_eq!(validate_request(Some(" k "), "文本"), Ok("k"));
    }

    #[tokio::test]
    async fn test_blank_keys_never_reach_client() {
        for key in [None, Some(String::new()), Some("   ".to_string())] {
            let mut shell = Shell::new(ScriptedClient::replying(VALID_REPLY)).with_api_key(key);
            let outcome = shell.analyze("去年夏天", |_| {}).await;
            assert_eq!(outcome, AnalysisOutcome::Invalid(ValidationError::MissingApiKey));
            assert_eq!(shell.client().calls.load(Ordering::SeqCst), 0);
            assert_eq!(shell.phase(), Phase::Idle);
        }
    }

    #[tokio::test]
    async fn test_phases_for_successful_trigger() {
        let mut shell =
            Shell::new(ScriptedClient::replying(VALID_REPLY)).with_api_key(Some("AIza-test".into()));
        let mut seen = Vec::new();
        let outcome = shell.analyze("去年夏天", |p| seen.push(p)).await;
        assert!(outcome.is_rendered());
        assert_eq!(
            seen,
            vec![Phase::Validating, Phase::Requesting, Phase::Rendering, Phase::Idle]
        );
        assert_eq!(shell.client().last_key.lock().unwrap().as_deref(), Some("AIza-test"));
    }

    #[tokio::test]
    async fn test_validation_skips_requesting() {
        let mut shell = Shell::new(ScriptedClient::replying(VALID_REPLY)).with_api_key(Some("k".into()));
        let mut seen = Vec::new();
        shell.analyze("", |p| seen.push(p)).await;
        assert_eq!(seen, vec![Phase::Validating, Phase::Idle]);
    }

    #[tokio::test]
    async fn test_provider_failure_returns_to_idle() {
        let mut shell =
            Shell::new(ScriptedClient::failing("quota exceeded")).with_api_key(Some("k".into()));
        let mut seen = Vec::new();
        let outcome = shell.analyze("去年夏天", |p| seen.push(p)).await;
        assert_eq!(outcome, AnalysisOutcome::Failed(ProviderError::new("quota exceeded")));
        assert!(!seen.contains(&Phase::Rendering));
        assert_eq!(shell.phase(), Phase::Idle);
        let text = console::strip_ansi_codes(&outcome.display(false)).to_string();
        assert_eq!(text, "连接出错: quota exceeded\n");
    }

    #[tokio::test]
    async fn test_session_records_last_trigger() {
        let mut shell = Shell::new(ScriptedClient::replying("不是 JSON")).with_api_key(Some("k".into()));
        shell.analyze("去年夏天", |_| {}).await;
        let session = shell.session();
        assert_eq!(session.last_text.as_deref(), Some("去年夏天"));
        assert!(matches!(
            session.last_outcome,
            Some(AnalysisOutcome::Rendered(RenderOutcome::Fallback { .. }))
        ));
    }

    #[tokio::test]
    async fn test_list_models_requires_key() {
        let mut shell = Shell::new(ScriptedClient::replying(VALID_REPLY));
        assert_eq!(
            shell.list_models().await,
            ModelsOutcome::Invalid(ValidationError::MissingApiKey)
        );
        assert_eq!(shell.client().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_models_failure_message() {
        let mut shell = Shell::new(ScriptedClient::failing("403")).with_api_key(Some("k".into()));
        let outcome = shell.list_models().await;
        let text = console::strip_ansi_codes(&outcome.display()).to_string();
        assert_eq!(text, "查询失败: 403\n");
        assert!(shell.session().last_outcome.is_none());
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let mut shell = Shell::new(ScriptedClient::replying(VALID_REPLY)).with_api_key(Some("k".into()));
        let outcome = shell.list_models().await;
        assert_eq!(outcome, ModelsOutcome::Listed(vec![]));
        assert!(!outcome.has_models());
    }
}
