//! Command-line entry point.
//!
//! Assembles a run from flags and/or a JSON config file and rehearses it
//! against the in-memory page, so a send plan (splitting, indexing, pacing,
//! hooks) can be validated before embedding the library against a live host
//! page. Ctrl-C cancels a run in flight.

use anyhow::{bail, Context};
use chat_message_sender::config::parse_duration;
use chat_message_sender::{Config, InMemoryPage, MessageSender, RunSummary, SplitRule};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cms",
    version,
    about = "Automated chat message sending - rehearses the configured send plan against an in-memory page"
)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Message text to send (overrides the config file)
    #[arg(short, long)]
    message: Option<String>,

    /// Pacing interval between sends, e.g. "500ms", "2s", "1m"
    #[arg(short, long)]
    interval: Option<String>,

    /// Number of times the full batch is resent
    #[arg(short, long)]
    repeat: Option<u32>,

    /// Prefix each fragment with a 1-based ordinal
    #[arg(long)]
    show_index: bool,

    /// Split the message on newlines
    #[arg(long, conflicts_with = "split_on")]
    split_lines: bool,

    /// Split the message on a literal delimiter
    #[arg(long, value_name = "DELIMITER")]
    split_on: Option<String>,

    /// Emit a diagnostic line per successful send
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to a JSON file and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config file '{path}'"))?,
            None => Config::default(),
        };

        if let Some(message) = self.message {
            config.message = message;
        }
        if let Some(interval) = &self.interval {
            config.interval = parse_duration(interval)?;
        }
        if let Some(repeat) = self.repeat {
            config.repeat_count = repeat;
        }
        if self.show_index {
            config.show_index = true;
        }
        if self.split_lines {
            config.split_rule = SplitRule::Newline;
        } else if let Some(delimiter) = self.split_on {
            config.split_rule = SplitRule::Delimiter(delimiter);
        }
        if self.verbose {
            config.verbose = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// The rehearsal page carries the elements the default locator strategy sets
/// expect: two contenteditable regions and a send button.
fn rehearsal_page() -> Arc<InMemoryPage> {
    let page = Arc::new(InMemoryPage::new());
    page.add_element("[contenteditable='true']", "search-box");
    page.add_element("[contenteditable='true']", "composer");
    page.add_element("[data-testid=\"send\"]", "send-button");
    page
}

fn print_summary(summary: &RunSummary) {
    if summary.cancelled {
        println!("{}", "⏹️  run cancelled".yellow());
    }
    println!(
        "{}",
        format!(
            "✅ run finished: {} sent, {} skipped",
            summary.sent_count(),
            summary.skipped_count()
        )
        .green()
    );
    let hook_errors = summary.hook_error_count();
    if hook_errors > 0 {
        println!("{}", format!("⚠️  {hook_errors} hook error(s)").red());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let save_config = cli.save_config.clone();
    let config = cli.into_config()?;

    if let Some(path) = save_config {
        config.save_to_file(&path)?;
        println!("{}", format!("💾 configuration saved to '{path}'").green());
        return Ok(());
    }

    if config.message.is_empty() {
        bail!("no message provided (use --message or a config file)");
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("{}", "received ctrl-c, cancelling run".yellow());
            ctrl_c_token.cancel();
        }
    });

    let page = rehearsal_page();
    let sender = MessageSender::from_config(config)
        .cancel_token(token)
        .build(page)?;

    println!(
        "{}",
        format!(
            "📨 starting run: {} repeat(s), interval {:?}",
            sender.config().repeat_count,
            sender.config().interval
        )
        .cyan()
    );

    let summary = sender.send_now().await?;
    print_summary(&summary);

    Ok(())
}
