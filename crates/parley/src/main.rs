//! Console front end for the bundled dialogues.

#[macro_use]
extern crate tracing;

mod report;

use std::process::{self, ExitCode};

use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use parley::core::responder::ConsoleResponder;
use parley::core::{DialogueLoop, EXIT_SENTINEL};
use parley::{ASSISTANT_NAME, CRITIC_NAME, PLANNER_NAME, Presets, USER_NAME};
use parley_ollama_model::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaConfig, OllamaConfigBuilder,
    OllamaProvider,
};
use tokio::{select, signal};
use tracing_subscriber::EnvFilter;

use crate::report::{ConsoleReporter, ReportStyle};

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "parley", version, about)]
/// Turn-taking dialogues between you and locally served models.
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ModelArgs {
    /// Model to chat with.
    #[arg(long, global = true, env = "PARLEY_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible endpoint of the Ollama server.
    #[arg(long, global = true, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Bearer token, for servers behind an authenticating proxy.
    #[arg(long, global = true, env = "OLLAMA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum model calls per turn.
    #[arg(long, global = true)]
    max_steps: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch two fixed responders greet each other.
    Greet,
    /// Chat with an assistant.
    Chat {
        /// Let the assistant look up the current time.
        #[arg(long)]
        tools: bool,
    },
    /// Have a planner draft a plan for your task and a critic review it.
    Plan,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.command))
        .with_writer(std::io::stderr)
        .init();

    let outcome = select! {
        result = run(cli) => Some(result),
        Ok(()) = signal::ctrl_c() => None,
    };
    match outcome {
        Some(Ok(())) => ExitCode::SUCCESS,
        Some(Err(err)) => {
            eprintln!("An error occurred: {err:#}");
            ExitCode::FAILURE
        }
        None => interrupted(),
    }
}

/// Exits right away. A pending console read occupies a blocking thread
/// that cannot be cancelled, and a regular runtime shutdown would wait
/// for it.
fn interrupted() -> ! {
    println!();
    println!("Interrupted.");
    process::exit(INTERRUPTED_EXIT_CODE)
}

fn log_filter(command: &Command) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(command)))
}

fn default_log_directive(command: &Command) -> &'static str {
    match command {
        // The greeters announce every message they receive.
        Command::Greet => "error,parley_core::responder::echo=info",
        Command::Chat { .. } | Command::Plan => "error",
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { model, command } = cli;
    match command {
        Command::Greet => greet().await,
        Command::Chat { tools } => chat(&model, tools).await,
        Command::Plan => plan(&model).await,
    }
}

async fn greet() -> anyhow::Result<()> {
    println!("{}", "Two responders are about to say hello.".dimmed());
    println!();

    let [alice, bob] = parley::greeters();
    let mut dialogue =
        DialogueLoop::builder(ConsoleResponder::stdio(USER_NAME))
            .with_responder(alice)
            .with_responder(bob)
            .with_observer(ConsoleReporter::new(ReportStyle::Greet))
            .build();
    dialogue.relay(parley::greeting()).await?;
    Ok(())
}

async fn chat(args: &ModelArgs, tools: bool) -> anyhow::Result<()> {
    let provider = provider(args);
    print_status(provider.config(), &[ASSISTANT_NAME]);

    let presets = presets(provider, args);
    let assistant = if tools {
        presets.assistant_with_tools()
    } else {
        presets.assistant()
    };
    if tools {
        print_line("Tools", "current_time");
    }
    print_instructions("Type a message and press Enter.");

    let mut dialogue =
        DialogueLoop::builder(ConsoleResponder::stdio(USER_NAME))
            .with_responder(assistant)
            .with_observer(ConsoleReporter::new(ReportStyle::Chat))
            .build();
    let summary = dialogue.run().await?;
    debug!("chat finished: {summary:?}");
    Ok(())
}

async fn plan(args: &ModelArgs) -> anyhow::Result<()> {
    let provider = provider(args);
    print_status(provider.config(), &[PLANNER_NAME, CRITIC_NAME]);

    let presets = presets(provider, args);
    print_instructions(
        "Describe a task. The planner drafts a plan, then the critic \
         reviews it.",
    );

    let mut dialogue =
        DialogueLoop::builder(ConsoleResponder::stdio(USER_NAME))
            .with_responder(presets.planner())
            .with_responder(presets.critic())
            .with_observer(ConsoleReporter::new(ReportStyle::Plan))
            .build();
    let summary = dialogue.run().await?;
    debug!("planning finished: {summary:?}");
    Ok(())
}

fn provider(args: &ModelArgs) -> OllamaProvider {
    let mut config = OllamaConfigBuilder::new()
        .with_model(&args.model)
        .with_base_url(&args.base_url);
    if let Some(api_key) = &args.api_key {
        config = config.with_api_key(api_key);
    }
    OllamaProvider::new(config.build())
}

fn presets(provider: OllamaProvider, args: &ModelArgs) -> Presets<OllamaProvider> {
    let presets = Presets::new(provider);
    match args.max_steps {
        Some(max_steps) => presets.with_max_steps(max_steps),
        None => presets,
    }
}

fn print_status(config: &OllamaConfig, responders: &[&str]) {
    print_line("Model", config.model());
    print_line("Server", config.base_url());
    print_line("Responders", &responders.join(" → "));
}

#[inline]
fn print_line(label: &str, value: &str) {
    println!("{} {:<11}{}", "●".bright_green(), label, value.bright_white());
}

fn print_instructions(hint: &str) {
    println!();
    println!("{hint} Type '{EXIT_SENTINEL}' to quit.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from([
            "parley", "chat", "--tools", "--model", "llama3.2", "--max-steps", "3",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Chat { tools: true }));
        assert_eq!(cli.model.model, "llama3.2");
        assert_eq!(cli.model.max_steps, Some(3));
    }

    #[test]
    fn test_greet_shows_received_messages() {
        let directive = default_log_directive(&Command::Greet);
        assert!(directive.contains("parley_core::responder::echo=info"));
        assert_eq!(default_log_directive(&Command::Plan), "error");
    }
}
