use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use super::OutputConfig;
use crate::api::CacheStore;
use crate::config::Config;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite existing configuration
    #[arg(long)]
    force: bool,
}

#[derive(Serialize)]
struct InitOutput {
    status: String,
    config: String,
    state: String,
    cache: String,
}

pub async fn run(args: InitArgs, output: OutputConfig) -> Result<()> {
    let config_path = Config::config_path()?;
    let state_path = Config::state_path()?;
    let cache_dir = Config::cache_dir()?;

    if config_path.exists() && !args.force {
        if output.json {
            let json_output = json!({
                "status": "already_initialized",
                "config": config_path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
            return Ok(());
        }
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    config.save(&config_path)?;

    // Re-initializing starts from a clean slate: drop cached API responses
    if args.force {
        for sub in ["external", "scripture"] {
            CacheStore::persistent(cache_dir.join(sub)).clear();
        }
    }

    if output.verbose && !output.quiet && !output.json {
        println!("  Writing config: {}", config_path.display());
    }

    if output.json {
        let json_output = InitOutput {
            status: "initialized".to_string(),
            config: config_path.display().to_string(),
            state: state_path.display().to_string(),
            cache: cache_dir.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        println!(
            "{} Moodlift initialized",
            "✓".green()
        );
        println!("  Config: {}", config_path.display());
        println!("  State:  {}", state_path.display());
        println!("  Cache:  {}", cache_dir.display());
        println!("\nNext steps:");
        println!("  {} to hook into Claude Code", "moodlift hook install".cyan());
        println!("  {} to try a message", "moodlift preview".cyan());
    }

    Ok(())
}
