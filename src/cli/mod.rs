mod completions;
mod hook;
mod init;
mod preview;
mod ratelimit;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moodlift")]
#[command(about = "Mood-boosting lifecycle hooks for Claude Code sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Show detailed progress
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default configuration file
    Init(init::InitArgs),

    /// Install, remove, and handle Claude Code hooks
    Hook(hook::HookArgs),

    /// Generate a message without waiting for a hook event
    Preview(preview::PreviewArgs),

    /// Inspect or reset the content rate limiter
    Ratelimit(ratelimit::RatelimitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let output = OutputConfig {
            json: self.json,
            quiet: self.quiet,
            verbose: self.verbose,
        };

        match self.command {
            Commands::Init(args) => init::run(args, output).await,
            Commands::Hook(args) => hook::run(args, output).await,
            Commands::Preview(args) => preview::run(args, output).await,
            Commands::Ratelimit(args) => ratelimit::run(args, output).await,
            Commands::Completions(args) => {
                completions::run(args);
                Ok(())
            }
        }
    }
}

/// Output configuration passed to all commands
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}
