//! TLDRR CLI
//!
//! Runs the extension's text transformations from a terminal: one-off
//! requests, prompt previews and thread summaries of page fixtures.

mod fixture;

use std::fs;
use std::io::Read;

use clap::{Parser, Subcommand};

use tldrr_core::text::{degraded_summary, ThreadDocument};
use tldrr_core::{HostProfile, StoredSettings};
use tldrr_service::{GeminiClient, GeminiConfig, RequestType};

use crate::fixture::PageFixture;

#[derive(Parser)]
#[command(name = "tldrr")]
#[command(about = "Translate, summarize and simplify text with the TLDRR service")]
struct Cli {
    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Stored settings JSON (same keys as the extension store)
    #[arg(long, global = true)]
    settings: Option<String>,

    /// Model override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform text and print the result
    Run {
        /// Request type (translate, tldr, eli5, format, thread-tldr)
        #[arg(short = 't', long = "type", default_value = "translate")]
        request_type: String,

        /// Input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Print the prompt that would be sent
    Prompt {
        #[arg(short = 't', long = "type", default_value = "translate")]
        request_type: String,

        #[arg(short, long)]
        input: Option<String>,
    },

    /// Summarize a thread page fixture
    Thread {
        /// Page fixture JSON: {"path", "post", "comments": [...]}
        #[arg(short, long)]
        page: String,

        /// Print the collected thread document instead of calling the service
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match &cli.command {
        Commands::Run { request_type, input } => cmd_run(&cli, request_type, input.as_deref()).await,
        Commands::Prompt { request_type, input } => cmd_prompt(request_type, input.as_deref()),
        Commands::Thread { page, dry_run } => cmd_thread(&cli, page, *dry_run).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_input(input: Option<&str>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e)),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(text)
        }
    }
}

/// Key from `--api-key`/`GEMINI_API_KEY`, else from `--settings`.
fn api_key(cli: &Cli) -> Result<Option<String>, String> {
    if let Some(key) = &cli.api_key {
        return Ok(Some(key.clone()));
    }
    let Some(path) = &cli.settings else {
        return Ok(None);
    };
    let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let stored: StoredSettings =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid settings '{}': {}", path, e))?;
    Ok(stored.api_key().map(str::to_string))
}

fn client(cli: &Cli) -> GeminiClient {
    let mut config = GeminiConfig::default();
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    GeminiClient::new(config)
}

async fn cmd_run(cli: &Cli, request_type: &str, input: Option<&str>) -> Result<(), String> {
    let text = read_input(input)?.trim().to_string();
    if text.is_empty() {
        return Err("Input is empty".to_string());
    }
    let request_type = RequestType::parse(request_type);
    let key = api_key(cli)?;

    match client(cli).translate(&text, &request_type, key.as_deref()).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) if request_type == RequestType::Tldr => {
            eprintln!("Warning: {e}; showing local summary");
            println!("{}", degraded_summary(&text));
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn cmd_prompt(request_type: &str, input: Option<&str>) -> Result<(), String> {
    let text = read_input(input)?;
    println!("{}", RequestType::parse(request_type).prompt(text.trim()));
    Ok(())
}

async fn cmd_thread(cli: &Cli, page: &str, dry_run: bool) -> Result<(), String> {
    let raw = fs::read_to_string(page).map_err(|e| format!("Failed to read '{}': {}", page, e))?;
    let fixture = PageFixture::parse(&raw).map_err(|e| format!("Invalid page fixture '{}': {}", page, e))?;

    let profile = HostProfile::default();
    if !profile.is_thread_path(&fixture.path) {
        log::warn!("'{}' is not a thread path, summarizing anyway", fixture.path);
    }

    let dom = fixture.to_dom();
    let document = ThreadDocument::collect(&dom, &profile);
    log::info!("collected post and {} comments", document.comments.len());
    let payload = document.render();

    if dry_run {
        println!("{}", payload);
        return Ok(());
    }

    let key = api_key(cli)?;
    let summary = client(cli)
        .translate(&payload, &RequestType::ThreadTldr, key.as_deref())
        .await
        .map_err(|e| e.to_string())?;

    println!("Thread Summary ({} comments)", document.comments.len());
    println!();
    println!("{}", summary);
    Ok(())
}
