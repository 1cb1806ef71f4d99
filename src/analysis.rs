// src/analysis.rs
// Typed view of the model's JSON reply and the parse/fallback decision

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::sanitize::sanitize;

/// A numeric field as the model wrote it.
///
/// The schema asks for numbers but models sometimes quote them, so both are
/// accepted and displayed verbatim. No range is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(serde_json::Number),
    Text(String),
}

impl Metric {
    /// Numbers and strings only; anything else is not displayable as a metric
    pub fn from_value(value: &Value) -> Option<Metric> {
        match value {
            Value::Number(n) => Some(Metric::Number(n.clone())),
            Value::String(s) => Some(Metric::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Number(n) => write!(f, "{}", n),
            Metric::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub words: Option<Value>,
    pub sentences: Option<Value>,
    pub avg_sent_len: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub narrativity: Option<Value>,
    pub syntactic_simplicity: Option<Value>,
    pub referential_cohesion: Option<Value>,
    pub semantic_similarity: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub hsk_level: Option<Value>,
    pub score: Option<Value>,
}

/// The JSON shape requested by `prompt::SYSTEM_PROMPT`.
///
/// Fields are kept as raw JSON values; `validate` types the ones the
/// dashboard displays and leaves the rest alone. A section that is not an
/// object reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub summary: Option<Value>,
    #[serde(default, deserialize_with = "section_or_default")]
    pub basic_stats: BasicStats,
    #[serde(default, deserialize_with = "section_or_default")]
    pub scores: Scores,
    #[serde(default, deserialize_with = "section_or_default")]
    pub readability: Readability,
    pub details: Option<Value>,
}

fn section_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keys the dashboard projects directly. Missing any of them is a schema
/// violation. `basic_stats.words` is shown as `N/A` when absent.
pub const REQUIRED_KEYS: [&str; 5] = [
    "summary",
    "details",
    "readability.hsk_level",
    "scores.narrativity",
    "scores.semantic_similarity",
];

/// A reply that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub summary: String,
    pub hsk_level: String,
    pub narrativity: Metric,
    pub semantic_similarity: Metric,
    pub words: Option<Metric>,
    pub details: String,
    /// Full typed reply, including fields not projected onto cards
    pub response: AnalysisResponse,
    /// The parsed JSON as received, for the raw view
    pub raw_json: Value,
}

/// Why a reply could not be shown as a dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// Not JSON at all, or not a JSON object
    InvalidJson(String),
    /// Valid JSON with a displayed key missing or of the wrong type
    Schema(String),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            ParseFailure::Schema(e) => write!(f, "schema mismatch: {}", e),
        }
    }
}

/// Result of interpreting one provider reply
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Parsed(Box<AnalysisReport>),
    /// Shown as the original, unsanitized provider text plus a notice
    Fallback { raw: String, reason: ParseFailure },
}

impl RenderOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, RenderOutcome::Parsed(_))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Collects every problem with the displayed keys so the reason names them all
#[derive(Default)]
struct KeyCheck {
    missing: Vec<&'static str>,
    mistyped: Vec<String>,
}

impl KeyCheck {
    fn text(&mut self, key: &'static str, value: &Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => {
                self.missing.push(key);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.mistyped
                    .push(format!("{} (expected string, got {})", key, kind(other)));
                None
            }
        }
    }

    fn metric(&mut self, key: &'static str, value: &Option<Value>) -> Option<Metric> {
        match value {
            None | Some(Value::Null) => {
                self.missing.push(key);
                None
            }
            Some(v) => {
                let metric = Metric::from_value(v);
                if metric.is_none() {
                    self.mistyped.push(format!(
                        "{} (expected number or string, got {})",
                        key,
                        kind(v)
                    ));
                }
                metric
            }
        }
    }

    fn reason(self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing keys: {}", self.missing.join(", ")));
        }
        if !self.mistyped.is_empty() {
            parts.push(format!("wrong types: {}", self.mistyped.join(", ")));
        }
        parts.join("; ")
    }
}

impl AnalysisResponse {
    /// Required keys absent from this reply, in `REQUIRED_KEYS` order
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let present = [
            &self.summary,
            &self.details,
            &self.readability.hsk_level,
            &self.scores.narrativity,
            &self.scores.semantic_similarity,
        ]
        .map(|v| !matches!(v, None | Some(Value::Null)));
        REQUIRED_KEYS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Single validation step deciding dashboard vs. fallback
    pub fn validate(self, raw_json: Value) -> Result<AnalysisReport, ParseFailure> {
        let mut check = KeyCheck::default();
        let summary = check.text("summary", &self.summary);
        let details = check.text("details", &self.details);
        let hsk_level = check.metric("readability.hsk_level", &self.readability.hsk_level);
        let narrativity = check.metric("scores.narrativity", &self.scores.narrativity);
        let semantic_similarity =
            check.metric("scores.semantic_similarity", &self.scores.semantic_similarity);

        match (summary, details, hsk_level, narrativity, semantic_similarity) {
            (
                Some(summary),
                Some(details),
                Some(hsk_level),
                Some(narrativity),
                Some(semantic_similarity),
            ) => Ok(AnalysisReport {
                summary,
                hsk_level: hsk_level.to_string(),
                narrativity,
                semantic_similarity,
                words: self.basic_stats.words.as_ref().and_then(Metric::from_value),
                details,
                response: self,
                raw_json,
            }),
            _ => Err(ParseFailure::Schema(check.reason())),
        }
    }
}

/// Parse already-sanitized text into a validated report
pub fn parse_clean(clean: &str) -> Result<AnalysisReport, ParseFailure> {
    let value: Value =
        serde_json::from_str(clean).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::InvalidJson(
            "top-level value is not an object".to_string(),
        ));
    }
    let response: AnalysisResponse = serde_json::from_value(value.clone())
        .map_err(|e| ParseFailure::Schema(e.to_string()))?;
    response.validate(value)
}

/// Sanitize and interpret a raw provider reply.
///
/// Failure keeps the raw text untouched so it can be shown verbatim.
pub fn interpret(raw: &str) -> RenderOutcome {
    match parse_clean(&sanitize(raw)) {
        Ok(report) => RenderOutcome::Parsed(Box::new(report)),
        Err(reason) => RenderOutcome::Fallback {
            raw: raw.to_string(),
            reason,
        },
    }
}
