use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::OutputConfig;
use crate::config::Config;
use crate::enhance::OllamaEnhancer;
use crate::limiter::RateLimiter;
use crate::selector::MessageSelector;
use crate::sources::{HookEvent, SourceKind, Sources};

#[derive(Args)]
pub struct PreviewArgs {
    /// Force a specific source instead of the weighted draw
    #[arg(long)]
    source: Option<SourceKind>,

    /// Event to generate for: session-start, stop, or notification
    #[arg(long, default_value = "session-start")]
    event: String,

    /// Skip the local enhancer even when it is enabled
    #[arg(long)]
    no_enhance: bool,
}

fn parse_event(name: &str) -> Result<HookEvent> {
    match name {
        "session-start" => Ok(HookEvent::SessionStart),
        "stop" => Ok(HookEvent::Stop),
        "notification" => Ok(HookEvent::Notification),
        other => anyhow::bail!(
            "unknown event '{other}' (expected session-start, stop, or notification)"
        ),
    }
}

pub async fn run(args: PreviewArgs, output: OutputConfig) -> Result<()> {
    let event = parse_event(&args.event)?;

    let mut config = Config::load_or_default();
    if args.no_enhance {
        config.enhancer.enabled = false;
    }
    // Preview always produces something; the probability gate is a runtime
    // concern, not a preview one
    config.enabled = true;
    let event_cfg = match event {
        HookEvent::SessionStart => &mut config.events.session_start,
        HookEvent::Stop => &mut config.events.stop,
        HookEvent::Notification => &mut config.events.notification,
    };
    event_cfg.enabled = true;
    event_cfg.probability = 1.0;

    let enhancer = OllamaEnhancer::new(&config.enhancer);
    let sources = Sources::from_config(&config)?;
    let limiter = RateLimiter::new(Config::state_path()?);
    let mut selector = MessageSelector::new(config, sources, limiter);

    let message = match args.source {
        Some(kind) => selector.preview(kind, event, &enhancer).await,
        None => selector.select(event, &enhancer).await,
    };

    let Some(message) = message else {
        if output.json {
            println!("{}", json!({"status": "no_message"}));
        } else if !output.quiet {
            eprintln!("{}", "No message available from that source right now.".yellow());
        }
        std::process::exit(1);
    };

    if output.json {
        let result = json!({
            "event": event.hook_name(),
            "source": args.source.map(SourceKind::name),
            "message": message,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{message}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_names() {
        assert_eq!(parse_event("stop").unwrap(), HookEvent::Stop);
        assert_eq!(
            parse_event("session-start").unwrap(),
            HookEvent::SessionStart
        );
        assert!(parse_event("PreToolUse").is_err());
    }
}
