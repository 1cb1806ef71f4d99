// tests/pipeline_test.rs
// End-to-end shell behavior against a scripted model client

mod common;

use common::{FakeClient, hsk4_reply};
use console::strip_ansi_codes;
use csl_metrix::analysis::{ParseFailure, RenderOutcome};
use csl_metrix::prompt::SYSTEM_PROMPT;
use csl_metrix::render::{NO_USABLE_MODELS, PARSE_FAILED_NOTICE, metric_cards};
use csl_metrix::{AnalysisOutcome, ModelsOutcome, Phase, Shell, ValidationError};

const SAMPLE_TEXT: &str = "去年夏天，我和朋友一起去了北京";

fn shell_with(client: FakeClient) -> Shell<FakeClient> {
    Shell::new(client).with_api_key(Some("AIza-test-key".to_string()))
}

fn plain(s: &str) -> String {
    strip_ansi_codes(s).to_string()
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    for key in [None, Some(""), Some("   "), Some("\t\n")] {
        let mut shell = Shell::new(FakeClient::replying(hsk4_reply()))
            .with_api_key(key.map(str::to_string));
        let outcome = shell.analyze(SAMPLE_TEXT, |_| {}).await;
        assert_eq!(outcome, AnalysisOutcome::Invalid(ValidationError::MissingApiKey));
        assert_eq!(shell.client().calls(), 0);
    }
}

#[tokio::test]
async fn test_missing_text_sends_nothing() {
    let mut shell = shell_with(FakeClient::replying(hsk4_reply()));
    let outcome = shell.analyze("", |_| {}).await;
    assert_eq!(outcome, AnalysisOutcome::Invalid(ValidationError::MissingText));
    assert_eq!(shell.client().calls(), 0);
    assert!(plain(&outcome.display(false)).contains("请输入需要分析的文本"));
}

// ============================================================================
// Successful analysis
// ============================================================================

#[tokio::test]
async fn test_request_carries_prompt_and_text() {
    let mut shell = shell_with(FakeClient::replying(hsk4_reply()));
    shell.analyze(SAMPLE_TEXT, |_| {}).await;

    let requests = shell.client().requests();
    assert_eq!(requests.len(), 1);
    let (key, system, text) = &requests[0];
    assert_eq!(key, "AIza-test-key");
    assert_eq!(system, SYSTEM_PROMPT);
    assert_eq!(text, SAMPLE_TEXT);
}

#[tokio::test]
async fn test_hsk4_dashboard() {
    let mut shell = shell_with(FakeClient::replying(hsk4_reply()));
    let outcome = shell.analyze(SAMPLE_TEXT, |_| {}).await;

    let AnalysisOutcome::Rendered(RenderOutcome::Parsed(report)) = &outcome else {
        panic!("expected dashboard, got {:?}", outcome);
    };
    let values: Vec<String> = metric_cards(report).iter().map(|c| c.value.clone()).collect();
    assert_eq!(values, vec!["HSK4", "85", "0.71", "15"]);

    let shown = plain(&outcome.display(false));
    assert!(shown.contains("分析完成！综合评价：叙述完整，句式简单，适合中级学习者。"));
    assert!(shown.contains("11 个维度分析"));
    assert!(shown.contains("描述性"));
    assert!(!shown.contains("## "), "details should be rendered, not raw Markdown");
}

#[tokio::test]
async fn test_fenced_reply_matches_plain_reply() {
    let mut plain_shell = shell_with(FakeClient::replying(hsk4_reply()));
    let mut fenced_shell =
        shell_with(FakeClient::replying(format!("```json\n{}\n```", hsk4_reply())));

    let a = plain_shell.analyze(SAMPLE_TEXT, |_| {}).await;
    let b = fenced_shell.analyze(SAMPLE_TEXT, |_| {}).await;
    assert!(matches!(a, AnalysisOutcome::Rendered(RenderOutcome::Parsed(_))));
    assert_eq!(a, b);
}

// ============================================================================
// Degradation paths
// ============================================================================

#[tokio::test]
async fn test_prose_reply_falls_back_to_raw_text() {
    let prose = "这段文字叙述性较强，但我无法给出 JSON。";
    let mut shell = shell_with(FakeClient::replying(prose));
    let outcome = shell.analyze(SAMPLE_TEXT, |_| {}).await;

    match &outcome {
        AnalysisOutcome::Rendered(RenderOutcome::Fallback { raw, reason }) => {
            assert_eq!(raw, prose);
            assert!(matches!(reason, ParseFailure::InvalidJson(_)));
        }
        other => panic!("expected fallback, got {:?}", other),
    }
    let shown = plain(&outcome.display(false));
    assert!(shown.contains(PARSE_FAILED_NOTICE));
    assert!(shown.contains(prose));
}

#[tokio::test]
async fn test_fallback_shows_unsanitized_text() {
    let reply = "```json\n{\"summary\": \"截断了\"\n```";
    let mut shell = shell_with(FakeClient::replying(reply));
    let outcome = shell.analyze(SAMPLE_TEXT, |_| {}).await;
    assert!(plain(&outcome.display(false)).contains(reply));
}

#[tokio::test]
async fn test_missing_key_in_json_falls_back() {
    let mut value: serde_json::Value = serde_json::from_str(&hsk4_reply()).unwrap();
    value["scores"].as_object_mut().unwrap().remove("narrativity");
    let mut shell = shell_with(FakeClient::replying(value.to_string()));

    let outcome = shell.analyze(SAMPLE_TEXT, |_| {}).await;
    match outcome {
        AnalysisOutcome::Rendered(RenderOutcome::Fallback { reason, .. }) => {
            assert!(matches!(reason, ParseFailure::Schema(_)));
        }
        other => panic!("expected schema fallback, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_error_shows_message_and_no_dashboard() {
    let mut shell = shell_with(FakeClient::failing("Gemini API error 429: quota exceeded"));
    let mut phases = Vec::new();
    let outcome = shell.analyze(SAMPLE_TEXT, |p| phases.push(p)).await;

    assert!(!outcome.is_rendered());
    assert_eq!(shell.phase(), Phase::Idle);
    assert_eq!(phases.last(), Some(&Phase::Idle));
    let shown = plain(&outcome.display(false));
    assert_eq!(shown, "连接出错: Gemini API error 429: quota exceeded\n");
}

#[tokio::test]
async fn test_retry_after_failure_uses_same_session() {
    let mut shell = Shell::new(FakeClient::replying(hsk4_reply()));
    let first = shell.analyze(SAMPLE_TEXT, |_| {}).await;
    assert_eq!(first, AnalysisOutcome::Invalid(ValidationError::MissingApiKey));

    shell.set_api_key(Some("AIza-late".to_string()));
    let second = shell.analyze(SAMPLE_TEXT, |_| {}).await;
    assert!(second.is_rendered());
    assert_eq!(shell.client().calls(), 1);
    assert_eq!(shell.session().last_outcome.as_ref(), Some(&second));
}

// ============================================================================
// Model listing
// ============================================================================

#[tokio::test]
async fn test_models_listed_in_provider_order() {
    let client = FakeClient::replying("").with_models(&["models/gemini-pro", "models/gemini-1.0-pro-001"]);
    let mut shell = shell_with(client);

    let outcome = shell.list_models().await;
    assert_eq!(
        outcome,
        ModelsOutcome::Listed(vec![
            "models/gemini-pro".to_string(),
            "models/gemini-1.0-pro-001".to_string()
        ])
    );
    let shown = plain(&outcome.display());
    let first = shown.find("models/gemini-pro\n").unwrap();
    let second = shown.find("models/gemini-1.0-pro-001").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_empty_listing_reports_no_usable_models() {
    let mut shell = shell_with(FakeClient::replying(""));
    let outcome = shell.list_models().await;
    assert!(!outcome.has_models());
    assert!(plain(&outcome.display()).contains(NO_USABLE_MODELS));
}

#[tokio::test]
async fn test_listing_does_not_touch_analysis_state() {
    let mut shell = shell_with(FakeClient::replying(hsk4_reply()).with_models(&["models/gemini-pro"]));
    shell.analyze(SAMPLE_TEXT, |_| {}).await;
    let before = shell.session().last_outcome.clone();
    shell.list_models().await;
    assert_eq!(shell.session().last_outcome, before);
}
