use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

use super::OutputConfig;
use crate::config::Config;
use crate::limiter::RateLimiter;

#[derive(Args)]
pub struct RatelimitArgs {
    #[command(subcommand)]
    command: RatelimitCommands,
}

#[derive(Subcommand)]
enum RatelimitCommands {
    /// Show tracked content types and their cooldown state
    Status,

    /// Clear cooldown state so content can be shown again
    Reset(ResetArgs),
}

#[derive(Args)]
struct ResetArgs {
    /// Content type to reset (resets everything when omitted)
    content_type: Option<String>,
}

pub async fn run(args: RatelimitArgs, output: OutputConfig) -> Result<()> {
    match args.command {
        RatelimitCommands::Status => run_status(output),
        RatelimitCommands::Reset(a) => run_reset(a, output),
    }
}

fn run_status(output: OutputConfig) -> Result<()> {
    let config = Config::load_or_default();
    let limiter = RateLimiter::new(Config::state_path()?);
    let cooldown = chrono::Duration::minutes(config.sources.scripture.rate_limit_minutes);

    let entries = limiter.entries();

    if output.json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|(content_type, shown_at)| {
                let remaining = limiter
                    .get_time_until_available(content_type, cooldown)
                    .map(|d| d.num_seconds());
                json!({
                    "content_type": content_type,
                    "last_shown": shown_at.to_rfc3339(),
                    "available_in_secs": remaining,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({"entries": items}))?);
    } else if !output.quiet {
        if entries.is_empty() {
            println!("Nothing on cooldown.");
            return Ok(());
        }
        println!("{} Rate limiter state", "⏱".bold());
        println!();
        for (content_type, shown_at) in &entries {
            match limiter.get_time_until_available(content_type, cooldown) {
                Some(remaining) => println!(
                    "  {:<12} available in {} min (last shown {})",
                    content_type,
                    remaining.num_minutes().max(1).to_string().cyan(),
                    shown_at.to_rfc3339().dimmed()
                ),
                None => println!(
                    "  {:<12} {} (last shown {})",
                    content_type,
                    "available".green(),
                    shown_at.to_rfc3339().dimmed()
                ),
            }
        }
    }

    Ok(())
}

fn run_reset(args: ResetArgs, output: OutputConfig) -> Result<()> {
    let mut limiter = RateLimiter::new(Config::state_path()?);
    limiter.reset(args.content_type.as_deref());

    if output.json {
        let result = json!({
            "status": "reset",
            "content_type": args.content_type,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !output.quiet {
        match args.content_type {
            Some(ct) => println!("{} Cooldown cleared for {}", "✓".green(), ct.cyan()),
            None => println!("{} All cooldowns cleared", "✓".green()),
        }
    }

    Ok(())
}
