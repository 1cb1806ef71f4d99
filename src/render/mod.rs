// src/render/mod.rs
// Dashboard rendering: metric cards, summary banner, details report, raw view

pub mod markdown;
pub mod theme;

use console::{Alignment, measure_text_width, pad_str, style};

use crate::analysis::{AnalysisReport, ParseFailure, RenderOutcome};
pub use markdown::render_markdown;

pub const PARSE_FAILED_NOTICE: &str = "数据解析失败，展示原始 AI 回复：";
pub const NO_USABLE_MODELS: &str = "没有找到支持 generateContent 的模型。可能 API Key 无效。";
const NOT_AVAILABLE: &str = "N/A";

/// One summary card: label over value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

/// The four cards shown above the report
pub fn metric_cards(report: &AnalysisReport) -> [MetricCard; 4] {
    [
        MetricCard {
            label: "预估 HSK 难度",
            value: report.hsk_level.clone(),
        },
        MetricCard {
            label: "叙述性 (Narrativity)",
            value: report.narrativity.to_string(),
        },
        MetricCard {
            label: "语义连贯性 (LSA)",
            value: report.semantic_similarity.to_string(),
        },
        MetricCard {
            label: "词数 (Words)",
            value: report
                .words
                .as_ref()
                .map(|w| w.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
    ]
}

fn card_row(widths: &[usize], cell: impl Fn(usize, usize) -> String) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, width)| cell(i, *width))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Model-supplied values may contain line breaks; a card holds one line
fn single_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lay cards out side by side in boxes
pub fn render_cards(cards: &[MetricCard]) -> String {
    let values: Vec<String> = cards.iter().map(|c| single_line(&c.value)).collect();
    let widths: Vec<usize> = cards
        .iter()
        .zip(&values)
        .map(|(c, v)| measure_text_width(c.label).max(measure_text_width(v)))
        .collect();

    let top = card_row(&widths, |_, w| format!("┌{}┐", "─".repeat(w + 2)));
    let labels = card_row(&widths, |i, w| {
        format!("│ {} │", style(pad_str(cards[i].label, w, Alignment::Left, None)).dim())
    });
    let value_row = card_row(&widths, |i, w| {
        format!("│ {} │", style(pad_str(&values[i], w, Alignment::Left, None)).bold())
    });
    let bottom = card_row(&widths, |_, w| format!("└{}┘", "─".repeat(w + 2)));

    format!("{}\n{}\n{}\n{}\n", top, labels, value_row, bottom)
}

/// Collapsed or expanded raw JSON view
pub fn render_raw_view(report: &AnalysisReport, expanded: bool) -> String {
    if !expanded {
        return theme::status("▸ 查看原始 JSON 数据（已折叠）\n");
    }
    let pretty = serde_json::to_string_pretty(&report.raw_json)
        .unwrap_or_else(|_| report.raw_json.to_string());
    format!("{}\n{}\n", theme::header("▾ 原始 JSON 数据"), pretty)
}

/// Full dashboard for a validated reply
pub fn render_report(report: &AnalysisReport, show_raw: bool) -> String {
    let mut out = String::new();
    out.push_str(&render_cards(&metric_cards(report)));
    out.push('\n');
    out.push_str(&theme::success(&format!(
        "✔ 分析完成！综合评价：{}",
        report.summary
    )));
    out.push_str("\n\n");
    out.push_str(&theme::status(&"─".repeat(40)));
    out.push_str("\n\n");
    out.push_str(&theme::header("📊 详细分析报告"));
    out.push_str("\n\n");
    out.push_str(&render_markdown(&report.details));
    out.push('\n');
    out.push_str(&render_raw_view(report, show_raw));
    out
}

/// Degraded view: the provider text exactly as received
pub fn render_fallback(raw: &str, reason: &ParseFailure) -> String {
    format!(
        "{}\n{}\n\n{}\n",
        theme::error(PARSE_FAILED_NOTICE),
        theme::status(&format!("({})", reason)),
        raw
    )
}

pub fn render_outcome(outcome: &RenderOutcome, show_raw: bool) -> String {
    match outcome {
        RenderOutcome::Parsed(report) => render_report(report, show_raw),
        RenderOutcome::Fallback { raw, reason } => render_fallback(raw, reason),
    }
}

/// Debug listing of usable models
pub fn render_models(names: &[String]) -> String {
    if names.is_empty() {
        return format!("{}\n", theme::error(NO_USABLE_MODELS));
    }
    let mut out = theme::success("查询成功！你的 API Key 支持以下模型：");
    out.push_str("\n\n");
    for name in names {
        out.push_str("  ");
        out.push_str(&theme::name(name));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&theme::status(
        "复制上面列表中的任意一个名字（例如 models/gemini-pro），通过 --model、CSL_METRIX_MODEL 或配置文件中的 model 使用它。",
    ));
    out.push('\n');
    out
}
