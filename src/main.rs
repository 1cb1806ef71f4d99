// src/main.rs
// CSL-Metrix - multi-dimensional analysis of Chinese L2 writing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use csl_metrix::analysis::RenderOutcome;
use csl_metrix::config::{self, FileConfig, Settings};
use csl_metrix::llm::{GeminiClient, http::create_client};
use csl_metrix::render::theme;
use csl_metrix::shell::repl::{Repl, busy_spinner};
use csl_metrix::shell::{AnalysisOutcome, Phase, Shell};

#[derive(Parser)]
#[command(name = "csl-metrix")]
#[command(about = "汉语二语写作多维分析 - Coh-Metrix style analysis via Google Gemini")]
#[command(version)]
struct Cli {
    /// Google API key (kept in memory only)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model id, e.g. gemini-pro or models/gemini-1.5-flash
    #[arg(long, env = "CSL_METRIX_MODEL", global = true)]
    model: Option<String>,

    /// Gemini REST base URL
    #[arg(long, env = "CSL_METRIX_API_BASE", global = true)]
    api_base: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Analyze one text and exit
    Analyze {
        /// Text to analyze
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file (default: stdin when piped)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the parsed JSON instead of the dashboard
        #[arg(long)]
        json: bool,

        /// Expand the raw JSON view under the dashboard
        #[arg(long)]
        raw: bool,
    },

    /// List models usable for analysis (debug)
    Models,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    config::load_dotenv();

    // Logs go to stderr so they never mix with rendered output
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        theme::set_enabled(false);
    }

    let settings = Settings::resolve(cli.model, cli.api_base, FileConfig::load());
    info!(model = %settings.model, "Starting csl-metrix");

    let client = GeminiClient::with_model(
        create_client(settings.request_timeout),
        &settings.api_base,
        &settings.model,
    );
    let shell = Shell::new(client).with_api_key(config::resolve_api_key(cli.api_key));

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            Repl::new(shell)?.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze {
            text,
            file,
            json,
            raw,
        } => {
            let text = read_text(text, file)?;
            run_analyze(shell, &text, json, raw).await
        }
        Commands::Models => {
            let mut shell = shell;
            let outcome = shell.list_models().await;
            print!("{}", outcome.display());
            Ok(if outcome.has_models() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Text from --text, --file, or piped stdin; empty when none is given
fn read_text(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    if !std::io::stdin().is_terminal() {
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
    }
    Ok(buf)
}

async fn run_analyze(
    mut shell: Shell<GeminiClient>,
    text: &str,
    json: bool,
    raw: bool,
) -> Result<ExitCode> {
    let mut spinner = None;
    let outcome = shell
        .analyze(text, |phase| match phase {
            Phase::Requesting => spinner = Some(busy_spinner()),
            _ => {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
            }
        })
        .await;

    if !outcome.is_rendered() {
        eprint!("{}", outcome.display(false));
        return Ok(ExitCode::FAILURE);
    }

    if json {
        let value = match &outcome {
            AnalysisOutcome::Rendered(RenderOutcome::Parsed(report)) => report.raw_json.clone(),
            AnalysisOutcome::Rendered(RenderOutcome::Fallback { raw, reason }) => {
                serde_json::json!({ "error": reason.to_string(), "raw": raw })
            }
            _ => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", outcome.display(raw));
    }
    Ok(ExitCode::SUCCESS)
}
