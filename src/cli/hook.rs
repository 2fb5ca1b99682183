use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::OutputConfig;
use crate::config::Config;
use crate::enhance::OllamaEnhancer;
use crate::limiter::RateLimiter;
use crate::selector::MessageSelector;
use crate::sources::{HookEvent, SourceKind, Sources};

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    command: HookCommands,
}

#[derive(Subcommand)]
enum HookCommands {
    /// Install moodlift hooks into Claude Code settings.json
    Install(InstallArgs),

    /// Remove moodlift hooks from Claude Code settings
    Uninstall(UninstallArgs),

    /// Show installed hooks and current config values
    Status(StatusArgs),

    /// Handle SessionStart events (internal, called by Claude Code)
    SessionStart(HandlerArgs),

    /// Handle Stop events (internal, called by Claude Code)
    Stop(HandlerArgs),

    /// Handle Notification events (internal, called by Claude Code)
    Notification(HandlerArgs),
}

#[derive(Args)]
struct InstallArgs {
    /// Install into project-local .claude/settings.json instead of ~/.claude
    #[arg(long)]
    project: bool,
}

#[derive(Args)]
struct UninstallArgs {
    /// Uninstall from project-local settings instead of ~/.claude
    #[arg(long)]
    project: bool,
}

#[derive(Args)]
struct StatusArgs {}

#[derive(Args)]
struct HandlerArgs {}

pub async fn run(args: HookArgs, output: OutputConfig) -> Result<()> {
    match args.command {
        HookCommands::Install(a) => run_install(a, output).await,
        HookCommands::Uninstall(a) => run_uninstall(a, output).await,
        HookCommands::Status(a) => run_status(a, output).await,
        HookCommands::SessionStart(_) => run_handler(HookEvent::SessionStart).await,
        HookCommands::Stop(_) => run_handler(HookEvent::Stop).await,
        HookCommands::Notification(_) => run_handler(HookEvent::Notification).await,
    }
}

/// Resolve the target settings.json path.
/// default → ~/.claude/settings.json
/// --project → <cwd>/.claude/settings.json
fn resolve_settings_path(project: bool) -> Result<PathBuf> {
    if project {
        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        Ok(cwd.join(".claude").join("settings.json"))
    } else {
        let home = std::env::var("HOME").context("HOME not set")?;
        Ok(PathBuf::from(home).join(".claude").join("settings.json"))
    }
}

/// Build the moodlift hook entries for Claude Code settings.json.
fn moodlift_hook_entries() -> serde_json::Value {
    let entry = |subcommand: &str| {
        json!([
            {
                "hooks": [
                    {
                        "type": "command",
                        "command": format!("moodlift hook {subcommand}"),
                        "timeout": 15
                    }
                ]
            }
        ])
    };
    json!({
        "hooks": {
            "SessionStart": entry("session-start"),
            "Stop": entry("stop"),
            "Notification": entry("notification"),
        }
    })
}

/// Check if a hook group entry contains a moodlift command.
fn is_moodlift_hook_group(group: &serde_json::Value) -> bool {
    group
        .get("hooks")
        .and_then(|h| h.as_array())
        .is_some_and(|hooks| {
            hooks.iter().any(|h| {
                h.get("command")
                    .and_then(|c| c.as_str())
                    .is_some_and(|c| c.starts_with("moodlift hook "))
            })
        })
}

/// Merge moodlift hooks into an existing settings object, preserving other
/// tools' hooks in each event array. Idempotent: stale moodlift entries are
/// dropped before the fresh ones go in.
fn merge_hooks(settings: &mut serde_json::Value) {
    let ours = moodlift_hook_entries();
    let Some(our_hooks) = ours.get("hooks").and_then(|h| h.as_object()) else {
        return;
    };
    if !settings["hooks"].is_object() {
        settings["hooks"] = json!({});
    }
    for (event_name, entries) in our_hooks {
        let slot = &mut settings["hooks"][event_name];
        if !slot.is_array() {
            // Missing, or an unrecognized shape another tool left behind
            *slot = json!([]);
        }
        if let Some(arr) = slot.as_array_mut() {
            arr.retain(|entry| !is_moodlift_hook_group(entry));
            arr.extend(entries.as_array().into_iter().flatten().cloned());
        }
    }
}

/// Remove moodlift hooks from a settings object, dropping event arrays (and
/// the hooks map itself) that end up empty. Returns true if anything was
/// removed.
fn remove_moodlift_hooks(settings: &mut serde_json::Value) -> bool {
    let Some(hooks) = settings.get_mut("hooks").and_then(|h| h.as_object_mut()) else {
        return false;
    };
    let mut removed = false;
    for entries in hooks.values_mut() {
        if let Some(arr) = entries.as_array_mut() {
            let before = arr.len();
            arr.retain(|entry| !is_moodlift_hook_group(entry));
            removed |= arr.len() < before;
        }
    }
    hooks.retain(|_, v| v.as_array().is_none_or(|a| !a.is_empty()));
    if hooks.is_empty() {
        if let Some(obj) = settings.as_object_mut() {
            obj.remove("hooks");
        }
    }
    removed
}

/// Check whether moodlift hooks are present in a settings.json Value.
fn has_moodlift_hooks(settings: &serde_json::Value) -> bool {
    settings
        .get("hooks")
        .and_then(|h| h.as_object())
        .is_some_and(|hooks| {
            hooks
                .values()
                .filter_map(|v| v.as_array())
                .any(|arr| arr.iter().any(is_moodlift_hook_group))
        })
}

/// Read a settings.json file, returning an empty object if missing.
fn read_settings(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write settings.json, creating parent directories as needed.
fn write_settings(path: &Path, settings: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content =
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

async fn run_install(args: InstallArgs, output: OutputConfig) -> Result<()> {
    let settings_path = resolve_settings_path(args.project)?;

    let mut settings = read_settings(&settings_path)?;
    merge_hooks(&mut settings);
    write_settings(&settings_path, &settings)?;

    // Make sure there is a config to edit later
    let config_path = Config::config_path()?;
    if !config_path.exists() {
        Config::default().save(&config_path)?;
    }

    if output.json {
        let result = json!({
            "status": "installed",
            "path": settings_path.display().to_string(),
            "project": args.project,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !output.quiet {
        let scope = if args.project { "project" } else { "global" };
        println!("{} Moodlift hooks installed ({})", "✓".green(), scope.cyan());
        println!(
            "  Location: {}",
            settings_path.display().to_string().dimmed()
        );
        println!("  SessionStart: {}", "session-start".cyan());
        println!("  Stop:         {}", "stop".cyan());
        println!("  Notification: {}", "notification".cyan());
    }

    Ok(())
}

async fn run_uninstall(args: UninstallArgs, output: OutputConfig) -> Result<()> {
    let settings_path = resolve_settings_path(args.project)?;

    if !settings_path.exists() {
        if output.json {
            let result = json!({
                "status": "not_installed",
                "path": settings_path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else if !output.quiet {
            println!("No hooks to remove ({})", settings_path.display());
        }
        return Ok(());
    }

    let mut settings = read_settings(&settings_path)?;
    let removed = remove_moodlift_hooks(&mut settings);
    write_settings(&settings_path, &settings)?;

    if output.json {
        let result = json!({
            "status": if removed { "uninstalled" } else { "not_installed" },
            "path": settings_path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !output.quiet {
        if removed {
            println!(
                "{} Moodlift hooks removed from {}",
                "✓".green(),
                settings_path.display()
            );
        } else {
            println!("No moodlift hooks found in {}", settings_path.display());
        }
    }

    Ok(())
}

async fn run_status(_args: StatusArgs, output: OutputConfig) -> Result<()> {
    let config = Config::load_or_default();
    let limiter = RateLimiter::new(Config::state_path()?);

    let global_settings = resolve_settings_path(false)?;
    let hooks_installed = read_settings(&global_settings)
        .map(|s| has_moodlift_hooks(&s))
        .unwrap_or(false);

    if output.json {
        let weights: serde_json::Map<String, serde_json::Value> = SourceKind::ALL
            .iter()
            .map(|k| {
                (
                    k.name().to_string(),
                    json!(config.sources.weight(*k)),
                )
            })
            .collect();
        let last_shown: serde_json::Map<String, serde_json::Value> = limiter
            .entries()
            .into_iter()
            .map(|(k, v)| (k, json!(v.to_rfc3339())))
            .collect();
        let status = json!({
            "hooks_installed": hooks_installed,
            "enabled": config.enabled,
            "weights": weights,
            "enhancer": {
                "enabled": config.enhancer.enabled,
                "model": config.enhancer.model,
            },
            "last_shown": last_shown,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if !output.quiet {
        println!("{} Moodlift configuration", "⚡".bold());
        println!();
        println!(
            "  Enabled:  {}",
            if config.enabled { "yes".green() } else { "no".yellow() }
        );
        for kind in SourceKind::ALL {
            let enabled = config.sources.is_enabled(kind);
            let weight = config.sources.weight(kind);
            let state = if enabled && weight > 0 {
                weight.to_string().cyan()
            } else {
                "off".dimmed()
            };
            println!("  {:<10} {}", format!("{}:", kind.name()), state);
        }
        println!(
            "  Enhancer: {} ({})",
            if config.enhancer.enabled { "on".green() } else { "off".yellow() },
            config.enhancer.model.dimmed()
        );
        println!();
        let hooks_str = if hooks_installed {
            "installed".green()
        } else {
            "not installed".yellow()
        };
        println!("  Claude Code hooks: {}", hooks_str);

        let entries = limiter.entries();
        if !entries.is_empty() {
            println!();
            println!("{} Rate limiter", "⏱".bold());
            for (content_type, shown_at) in entries {
                println!(
                    "  {:<12} last shown {}",
                    content_type,
                    shown_at.to_rfc3339().dimmed()
                );
            }
        }
    }

    Ok(())
}

/// Hook event input on stdin (subset of fields we need)
#[derive(Debug, Default, Deserialize)]
struct HookInput {
    #[serde(default)]
    hook_event_name: String,
    #[serde(default)]
    session_id: String,
    /// Set when a Stop hook re-fires because a previous Stop hook already
    /// continued the conversation
    #[serde(default)]
    stop_hook_active: bool,
    /// Notification text, present on Notification events
    #[serde(default)]
    message: String,
}

/// Notification events fire for all kinds of system chatter; only the ones
/// where the user is actually being waited on deserve encouragement.
fn notification_wants_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("waiting") || lower.contains("permission")
}

async fn run_handler(event: HookEvent) -> Result<()> {
    // Never disrupt the user's session: any failure exits quietly
    if let Err(e) = handle_event(event).await {
        eprintln!("moodlift hook {}: {e:#}", event.hook_name());
    }
    Ok(())
}

async fn handle_event(event: HookEvent) -> Result<()> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read hook input")?;
    // Malformed input is treated as an empty event rather than an error
    let input: HookInput = serde_json::from_str(&buf).unwrap_or_default();

    // A mismatched event name means a misconfigured hook entry; stay silent
    if !input.hook_event_name.is_empty()
        && HookEvent::from_hook_name(&input.hook_event_name) != Some(event)
    {
        tracing::debug!(
            got = %input.hook_event_name,
            expected = event.hook_name(),
            "hook event mismatch"
        );
        return Ok(());
    }

    if event == HookEvent::Stop && input.stop_hook_active {
        return Ok(());
    }
    if event == HookEvent::Notification && !notification_wants_message(&input.message) {
        return Ok(());
    }

    tracing::debug!(
        event = event.hook_name(),
        session = %input.session_id,
        "handling hook event"
    );

    let config = Config::load_or_default();
    let enhancer = OllamaEnhancer::new(&config.enhancer);
    let sources = Sources::from_config(&config)?;
    let limiter = RateLimiter::new(Config::state_path()?);
    let mut selector = MessageSelector::new(config, sources, limiter);

    let Some(message) = selector.select(event, &enhancer).await else {
        return Ok(());
    };

    match event {
        // SessionStart output is JSON so the message lands in the system
        // area instead of the transcript
        HookEvent::SessionStart => {
            let out = json!({
                "suppressOutput": true,
                "systemMessage": message,
            });
            println!("{out}");
        }
        HookEvent::Stop | HookEvent::Notification => {
            println!("{message}");
        }
    }
    Ok(())
}
