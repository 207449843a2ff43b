//! The `aicodegen` command line tool.

#[macro_use]
extern crate tracing;

mod config;
mod prompts;

use std::env;
use std::io::Write as _;
use std::pin::pin;
use std::process::ExitCode;
use std::time::Duration;

use aicodegen::SessionBuilder;
use aicodegen_model::ToolCallRequest;
use aicodegen_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

/// Your OpenAI-powered coding assistant.
#[derive(Parser)]
#[command(name = "aicodegen", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Set your OpenAI API key
    Init,
    /// Start the assistant with a named prompt
    Use {
        /// Name of the prompt, e.g. `sample`
        name: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let prompt = match cli.command {
        Some(Command::Init) => return init().await,
        Some(Command::Use { name }) => match prompts::find(&name) {
            Some(prompt) => prompt,
            None => {
                eprintln!(
                    "Unknown prompt \"{name}\". Available prompts: {}",
                    prompts::names()
                );
                return ExitCode::FAILURE;
            }
        },
        None => &prompts::PROMPTS[0],
    };

    let settings = match config::config_path()
        .and_then(|path| config::load(&path, |name| env::var(name).ok()))
    {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}: {err}", "Error".bright_red());
            return ExitCode::FAILURE;
        }
    };
    debug!("loaded settings: {settings:?}");

    let mut config_builder =
        OpenAIConfigBuilder::with_api_key(settings.api_key);
    if let Some(model) = settings.model {
        config_builder = config_builder.with_model(model);
    }
    if let Some(base_url) = settings.base_url {
        config_builder = config_builder.with_base_url(base_url);
    }
    let model_provider = OpenAIProvider::new(config_builder.build());

    let (tool_tx, mut tool_rx) = mpsc::unbounded_channel();
    let mut session = SessionBuilder::with_model_provider(model_provider)
        .with_system_prompt(prompt.system_prompt())
        .on_tool_call(move |call| {
            tool_tx.send(call.clone()).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    println!("{}", prompt.start_message());
    loop {
        print!("{}: ", "You".bright_blue());
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut turn = pin!(session.send_message(input));
        let mut progress_bar: Option<ProgressBar> = None;
        let result = loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            select! {
                result = &mut turn => break result,
                Some(call) = tool_rx.recv() => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    print_tool_call(&call);
                },
                _ = sleep(Duration::from_millis(100)) => {},
            }
        };

        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        while let Ok(call) = tool_rx.try_recv() {
            print_tool_call(&call);
        }

        match result {
            Ok(answer) => {
                println!(
                    "{}{}: {}",
                    BAR_CHAR.bright_cyan(),
                    "GPT".bright_yellow(),
                    answer.bright_white()
                );
            }
            Err(err) => {
                println!(
                    "{}{}: {err}",
                    BAR_CHAR.bright_red(),
                    "Error".bright_red()
                );
            }
        }
    }

    println!("\nSession ended.");
    ExitCode::SUCCESS
}

async fn init() -> ExitCode {
    let path = match config::config_path() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{}: {err}", "Error".bright_red());
            return ExitCode::FAILURE;
        }
    };

    print!("Enter your OpenAI API key: ");
    std::io::stdout().flush().ok();
    let Some(line) = read_line().await else {
        return ExitCode::FAILURE;
    };
    let api_key = line.trim();
    if api_key.is_empty() {
        eprintln!("{}: the API key must not be empty", "Error".bright_red());
        return ExitCode::FAILURE;
    }

    match config::save_api_key(&path, api_key) {
        Ok(()) => {
            println!("API key saved to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", "Error".bright_red());
            ExitCode::FAILURE
        }
    }
}

fn print_tool_call(call: &ToolCallRequest) {
    println!(
        "{}🔧 {}",
        BAR_CHAR.bright_black(),
        format!("{}({})", call.name, call.arguments).dimmed()
    );
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
