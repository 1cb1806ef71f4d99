//! Interactive REPL front end for the shell
//!
//! Submitting text triggers an analysis. Slash commands cover the key, the
//! model listing and the raw JSON view. Line history stays in memory.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::time::Duration;

use super::{AnalysisOutcome, Phase, Shell};
use crate::analysis::RenderOutcome;
use crate::llm::ModelClient;
use crate::render::{self, theme};

pub const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";
const BUSY_MESSAGE: &str = "AI 正在进行 11 个维度的计算（耗时约 10-20秒）...";

/// REPL commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Set the key; without an argument, prompt with hidden input
    Key(Option<String>),
    Models,
    Json,
    Last,
    Status,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse a `/`-prefixed line, `None` for ordinary text
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        Some(match name {
            "help" | "h" | "?" => Command::Help,
            "key" => Command::Key(arg),
            "models" => Command::Models,
            "json" => Command::Json,
            "last" => Command::Last,
            "status" => Command::Status,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        })
    }
}

pub struct Repl<C: ModelClient> {
    editor: DefaultEditor,
    shell: Shell<C>,
}

impl<C: ModelClient> Repl<C> {
    pub fn new(shell: Shell<C>) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            shell,
        })
    }

    /// Run the REPL loop until EOF or /quit
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        if self.shell.session().api_key.is_none() {
            self.prompt_api_key();
        }

        loop {
            let Some(input) = self.read_input()? else {
                println!("再见！");
                break;
            };
            let trimmed = input.trim();
            if trimmed.is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(trimmed);

            match Command::parse(trimmed) {
                Some(Command::Quit) => {
                    println!("再见！");
                    break;
                }
                Some(command) => self.handle_command(command).await,
                None => self.run_analysis(&input).await,
            }
        }

        Ok(())
    }

    fn print_banner(&self) {
        println!("{}", theme::header("🇨🇳 汉语二语写作多维分析工具 (CSL-Metrix)"));
        println!(
            "{}",
            theme::status(&format!(
                "基于 Google Gemini ({})，模拟 Coh-Metrix 指标体系。",
                self.shell.client().model_name()
            ))
        );
        println!();
        println!("  粘贴文本后回车即开始分析；多行文本请用 \"\"\" 包围，或在行尾加 \\ 续行");
        println!("  /key 设置 API Key，/models 检查可用模型，/json 展开原始 JSON，/help 查看全部命令");
        println!("  获取免费 API Key：{}", API_KEY_URL);
        println!("{}", theme::status("  提示：API Key 仅在内存中使用，不会被存储。"));
        println!();
    }

    fn print_help(&self) {
        println!("命令：");
        println!("  /help            显示帮助");
        println!("  /key [KEY]       设置 API Key（不带参数时隐藏输入）");
        println!("  /models          检查可用模型列表");
        println!("  /json            展开上一次结果的原始 JSON 数据");
        println!("  /last            重新显示上一次结果");
        println!("  /status          显示当前会话状态");
        println!("  /quit            退出");
    }

    /// Password-style key entry; empty input keeps the current key
    fn prompt_api_key(&mut self) {
        let entered = dialoguer::Password::new()
            .with_prompt("请输入 Google API Key")
            .allow_empty_password(true)
            .interact();
        match entered {
            Ok(key) if !key.trim().is_empty() => {
                self.shell.set_api_key(Some(key));
                println!("{}", theme::success("API Key 已设置（仅保存在内存中）。"));
            }
            Ok(_) => {
                println!("{}", theme::warning("未输入 API Key，稍后可用 /key 设置。"));
            }
            Err(e) => {
                println!("{}", theme::error(&format!("读取 API Key 失败: {}", e)));
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Help => self.print_help(),
            Command::Key(Some(key)) => {
                self.shell.set_api_key(Some(key));
                println!("{}", theme::success("API Key 已设置（仅保存在内存中）。"));
            }
            Command::Key(None) => self.prompt_api_key(),
            Command::Models => {
                println!("{}", theme::status("正在查询 Google 服务器..."));
                let outcome = self.shell.list_models().await;
                print!("{}", outcome.display());
            }
            Command::Json => match &self.shell.session().last_outcome {
                Some(AnalysisOutcome::Rendered(RenderOutcome::Parsed(report))) => {
                    print!("{}", render::render_raw_view(report, true));
                }
                _ => println!("{}", theme::warning("还没有可展开的 JSON 结果。")),
            },
            Command::Last => match &self.shell.session().last_outcome {
                Some(outcome) => print!("{}", outcome.display(false)),
                None => println!("{}", theme::warning("还没有分析结果。")),
            },
            Command::Status => {
                let session = self.shell.session();
                println!("模型: {}", theme::name(&self.shell.client().model_name()));
                println!(
                    "API Key: {}",
                    if session.api_key.is_some() { "已设置" } else { "未设置" }
                );
                println!(
                    "上一次文本: {}",
                    session
                        .last_text
                        .as_ref()
                        .map(|t| format!("{} 字", t.chars().count()))
                        .unwrap_or_else(|| "无".to_string())
                );
            }
            Command::Quit => {}
            Command::Unknown(name) => {
                println!("{}", theme::warning(&format!("未知命令: /{}（输入 /help 查看命令）", name)));
            }
        }
    }

    async fn run_analysis(&mut self, text: &str) {
        let mut spinner: Option<ProgressBar> = None;
        let outcome = self
            .shell
            .analyze(text, |phase| match phase {
                Phase::Requesting => spinner = Some(busy_spinner()),
                _ => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                }
            })
            .await;
        print!("{}", outcome.display(false));
        println!();
    }

    /// Read input with multi-line support
    fn read_input(&mut self) -> Result<Option<String>> {
        let first_line = match self.editor.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                return Ok(Some(String::new()));
            }
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let trimmed = first_line.trim();
        if trimmed.starts_with("\"\"\"") {
            return self.read_multiline_block(trimmed);
        }
        if trimmed.ends_with('\\') {
            return self.read_continuation_lines(trimmed);
        }
        Ok(Some(first_line))
    }

    /// Read a block delimited by """
    fn read_multiline_block(&mut self, first_line: &str) -> Result<Option<String>> {
        let mut lines = Vec::new();

        let after_open = first_line.strip_prefix("\"\"\"").unwrap_or(first_line);
        if let Some(single) = after_open.strip_suffix("\"\"\"") {
            return Ok(Some(single.to_string()));
        }
        if !after_open.is_empty() {
            lines.push(after_open.to_string());
        }

        loop {
            match self.editor.readline("... ") {
                Ok(line) => {
                    if let Some(before_close) = line.trim_end().strip_suffix("\"\"\"") {
                        if !before_close.trim().is_empty() {
                            lines.push(before_close.to_string());
                        }
                        break;
                    }
                    lines.push(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C（已取消多行输入）");
                    return Ok(Some(String::new()));
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Some(lines.join("\n")))
    }

    /// Read continuation lines ending with \
    fn read_continuation_lines(&mut self, first_line: &str) -> Result<Option<String>> {
        let mut lines = vec![first_line.strip_suffix('\\').unwrap_or(first_line).to_string()];

        loop {
            match self.editor.readline("... ") {
                Ok(line) => {
                    let trimmed = line.trim_end();
                    match trimmed.strip_suffix('\\') {
                        Some(part) => lines.push(part.to_string()),
                        None => {
                            lines.push(line);
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C（已取消多行输入）");
                    return Ok(Some(String::new()));
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Some(lines.join("\n")))
    }
}

/// Spinner shown while a request is in flight
pub fn busy_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(BUSY_MESSAGE);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
