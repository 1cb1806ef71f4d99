// tests/common/mod.rs
// Scripted model client shared by integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use csl_metrix::{ModelClient, ProviderError};

/// Records every request and answers from a script
pub struct FakeClient {
    reply: Result<String, ProviderError>,
    models: Result<Vec<String>, ProviderError>,
    analyze_calls: AtomicUsize,
    list_calls: AtomicUsize,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl FakeClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            models: Ok(vec![]),
            analyze_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(ProviderError::new(message)),
            models: Err(ProviderError::new(message)),
            ..Self::replying("")
        }
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Ok(models.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Total network-equivalent calls made
    pub fn calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst) + self.list_calls.load(Ordering::SeqCst)
    }

    /// (api_key, system_prompt, user_text) of each analyze call
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeClient {
    async fn analyze(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            api_key.to_string(),
            system_prompt.to_string(),
            user_text.to_string(),
        ));
        self.reply.clone()
    }

    async fn list_models(&self, _api_key: &str) -> Result<Vec<String>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.models.clone()
    }

    fn model_name(&self) -> String {
        "fake-model".to_string()
    }
}

/// A reply matching the contracted schema
pub fn hsk4_reply() -> String {
    serde_json::json!({
        "summary": "叙述完整，句式简单，适合中级学习者。",
        "basic_stats": {"words": 15, "sentences": 1, "avg_sent_len": 15},
        "scores": {
            "narrativity": 85,
            "syntactic_simplicity": 78,
            "referential_cohesion": 0.35,
            "semantic_similarity": 0.71
        },
        "readability": {"hsk_level": "HSK4", "score": 72},
        "details": "## 11 个维度分析\n\n| 维度 | 结果 |\n|---|---|\n| 描述性 | 1 句，15 词 |\n| 叙述性 | 85 |"
    })
    .to_string()
}
