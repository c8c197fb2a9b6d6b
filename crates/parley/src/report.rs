use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley::core::{Ending, Message, TurnObserver};

const BAR_CHAR: &str = "▎";

/// How much of a dialogue is echoed to the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStyle {
    /// Every message as it passes, no spinner.
    Greet,
    /// Spinner only; replies show up at the next prompt.
    Chat,
    /// Every reply as it arrives, then a summary of the round.
    Plan,
}

/// Prints status lines around each turn.
pub struct ConsoleReporter {
    style: ReportStyle,
    progress_style: ProgressStyle,
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(style: ReportStyle) -> Self {
        let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            style,
            progress_style,
            spinner: None,
        }
    }

    fn start_spinner(&mut self, name: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(self.progress_style.clone());
        spinner.set_message(format!("🤔 {name} is thinking..."));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    // Must run before anything else is printed.
    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl TurnObserver for ConsoleReporter {
    fn on_user_input(&mut self, msg: &Message) {
        if self.style == ReportStyle::Greet {
            print_message(msg);
        }
    }

    fn on_turn_started(&mut self, name: &str) {
        if self.style != ReportStyle::Greet {
            self.start_spinner(name);
        }
    }

    fn on_turn_finished(&mut self, msg: &Message) {
        self.clear_spinner();
        match self.style {
            ReportStyle::Greet => print_message(msg),
            ReportStyle::Chat => {}
            ReportStyle::Plan => {
                print_block(msg.name(), msg.content());
                println!();
            }
        }
    }

    fn on_round_finished(&mut self, input: &Message, outputs: &[Message]) {
        if self.style != ReportStyle::Plan {
            return;
        }
        println!("{}", "──── Summary ────".bright_yellow());
        print_block("task", input.content());
        for output in outputs {
            print_block(output.name(), output.content());
        }
        println!();
    }

    fn on_terminated(&mut self, ending: Ending) {
        self.clear_spinner();
        match ending {
            Ending::Sentinel => println!("Dialogue ended."),
            Ending::InputClosed => {
                println!();
                println!("Input closed. Dialogue ended.");
            }
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

fn print_message(msg: &Message) {
    println!("{}: {}", msg.name().bright_white().bold(), msg.content());
}

fn print_block(title: &str, content: &str) {
    let bar = BAR_CHAR.bright_cyan();
    println!("{bar}{}", title.bright_white().bold());
    for line in content.lines() {
        println!("{bar}{line}");
    }
}
