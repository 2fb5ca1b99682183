use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::EnhancerConfig;

/// Optional local text generation. Implementations are best-effort: `None`
/// from `generate` means "no enhancement available", and callers fall back
/// to their unenhanced message.
pub trait TextEnhancer {
    fn is_enabled(&self) -> bool;
    async fn generate(&self, prompt: &str) -> Option<String>;
}

/// Enhancer backed by a local `ollama` install, driven over stdin with a
/// strict timeout. If ollama is missing, slow, or produces garbage the
/// enhancement is silently skipped.
pub struct OllamaEnhancer {
    enabled: bool,
    model: String,
    timeout: Duration,
    preferred_models: Vec<String>,
}

impl OllamaEnhancer {
    pub fn new(config: &EnhancerConfig) -> Self {
        Self {
            enabled: config.enabled,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            preferred_models: config.preferred_models.clone(),
        }
    }

    /// Models installed locally, per `ollama list`. Empty when ollama is not
    /// available.
    pub async fn available_models(&self) -> Vec<String> {
        let output = Command::new("ollama")
            .arg("list")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output();
        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(out)) if out.status.success() => {
                parse_model_list(&String::from_utf8_lossy(&out.stdout))
            }
            _ => Vec::new(),
        }
    }

    /// The model to run: first preferred model that is installed, else the
    /// configured one.
    pub async fn resolve_model(&self) -> String {
        let installed = self.available_models().await;
        self.preferred_models
            .iter()
            .find(|m| installed.contains(m))
            .cloned()
            .unwrap_or_else(|| self.model.clone())
    }

    async fn run_model(&self, prompt: &str) -> Option<String> {
        let model = self.resolve_model().await;
        let mut child = Command::new("ollama")
            .arg("run")
            .arg(&model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .ok()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await.ok()?;
            // Close stdin so the model knows the prompt is complete
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .ok()?
            .ok()?;
        if !output.status.success() {
            return None;
        }
        clean_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TextEnhancer for OllamaEnhancer {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn generate(&self, prompt: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let result = self.run_model(prompt).await;
        if result.is_none() {
            tracing::debug!(model = %self.model, "ollama generation unavailable");
        }
        result
    }
}

/// Extract model names from `ollama list` output. The first line is a
/// header; each following line starts with the model name.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
        .collect()
}

/// Reduce raw model output to a single usable line: first non-empty line,
/// trimmed, surrounding quotes dropped. Rejects empty and runaway output.
fn clean_output(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.trim_matches('"').trim();
    if line.is_empty() || line.len() > 300 {
        return None;
    }
    Some(line.to_string())
}
