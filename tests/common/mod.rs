use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated environment for CLI tests: a private config dir and a private
/// HOME, so nothing touches the user's real settings and no test sees
/// another's state.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().expect("failed to create config dir"),
            home: TempDir::new().expect("failed to create home dir"),
        }
    }

    /// Environment with a config that works fully offline: only the static
    /// default source carries weight, and the local enhancer is off.
    pub fn offline() -> Self {
        let env = Self::new();
        env.write_config(
            r#"
[sources.weights]
default = 100

[sources.external]
enabled = false

[sources.scripture]
enabled = false

[sources.stoic]
enabled = false

[enhancer]
enabled = false
"#,
        );
        env
    }

    pub fn write_config(&self, toml: &str) {
        std::fs::write(self.config_dir.path().join("config.toml"), toml)
            .expect("failed to write config");
    }

    /// A moodlift command wired to this environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("moodlift").expect("binary not built");
        cmd.env("MOODLIFT_CONFIG_DIR", self.config_dir.path())
            .env("HOME", self.home.path());
        cmd
    }

    pub fn settings_path(&self) -> std::path::PathBuf {
        self.home.path().join(".claude").join("settings.json")
    }

    pub fn read_settings(&self) -> serde_json::Value {
        let content =
            std::fs::read_to_string(self.settings_path()).expect("settings.json missing");
        serde_json::from_str(&content).expect("settings.json unparsable")
    }
}
