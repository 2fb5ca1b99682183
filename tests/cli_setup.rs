mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn init_creates_default_config() {
    let env = TestEnv::new();

    env.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));

    let config_path = env.config_dir.path().join("config.toml");
    let content = std::fs::read_to_string(config_path).unwrap();
    assert!(content.contains("[sources.weights]"));
    assert!(content.contains("[enhancer]"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let env = TestEnv::new();
    env.cmd().arg("init").assert().success();

    env.cmd()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    env.cmd().args(["init", "--force"]).assert().success();
}

#[test]
fn install_writes_all_three_events() {
    let env = TestEnv::offline();

    env.cmd()
        .args(["hook", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"));

    let settings = env.read_settings();
    for event in ["SessionStart", "Stop", "Notification"] {
        let entries = settings["hooks"][event].as_array().unwrap();
        assert_eq!(entries.len(), 1, "{event} should have one hook group");
        let command = entries[0]["hooks"][0]["command"].as_str().unwrap();
        assert!(command.starts_with("moodlift hook "));
    }
}

#[test]
fn install_preserves_foreign_hooks_and_settings() {
    let env = TestEnv::offline();

    let existing = serde_json::json!({
        "model": "opus",
        "hooks": {
            "Stop": [
                {"hooks": [{"type": "command", "command": "other-tool notify"}]}
            ]
        }
    });
    std::fs::create_dir_all(env.settings_path().parent().unwrap()).unwrap();
    std::fs::write(env.settings_path(), existing.to_string()).unwrap();

    env.cmd().args(["hook", "install"]).assert().success();

    let settings = env.read_settings();
    assert_eq!(settings["model"], "opus");
    let stop = settings["hooks"]["Stop"].as_array().unwrap();
    assert_eq!(stop.len(), 2);
}

#[test]
fn reinstall_does_not_duplicate_entries() {
    let env = TestEnv::offline();

    env.cmd().args(["hook", "install"]).assert().success();
    env.cmd().args(["hook", "install"]).assert().success();

    let settings = env.read_settings();
    for event in ["SessionStart", "Stop", "Notification"] {
        assert_eq!(settings["hooks"][event].as_array().unwrap().len(), 1);
    }
}

#[test]
fn uninstall_removes_only_our_hooks() {
    let env = TestEnv::offline();

    let existing = serde_json::json!({
        "hooks": {
            "Stop": [
                {"hooks": [{"type": "command", "command": "other-tool notify"}]}
            ]
        }
    });
    std::fs::create_dir_all(env.settings_path().parent().unwrap()).unwrap();
    std::fs::write(env.settings_path(), existing.to_string()).unwrap();

    env.cmd().args(["hook", "install"]).assert().success();
    env.cmd()
        .args(["hook", "uninstall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));

    let settings = env.read_settings();
    let stop = settings["hooks"]["Stop"].as_array().unwrap();
    assert_eq!(stop.len(), 1);
    assert_eq!(
        stop[0]["hooks"][0]["command"].as_str().unwrap(),
        "other-tool notify"
    );
}

#[test]
fn uninstall_without_settings_file_succeeds() {
    let env = TestEnv::offline();

    env.cmd()
        .args(["hook", "uninstall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No hooks to remove"));
}

#[test]
fn status_reports_json_shape() {
    let env = TestEnv::offline();
    env.cmd().args(["hook", "install"]).assert().success();

    let output = env
        .cmd()
        .args(["hook", "status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(status["hooks_installed"], serde_json::json!(true));
    assert_eq!(status["weights"]["default"], serde_json::json!(100));
    assert_eq!(status["enhancer"]["enabled"], serde_json::json!(false));
}

#[test]
fn preview_produces_a_message_offline() {
    let env = TestEnv::offline();

    let output = env
        .cmd()
        .args(["preview", "--source", "default", "--event", "stop"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(output).unwrap().trim().is_empty());
}

#[test]
fn preview_json_includes_source_and_event() {
    let env = TestEnv::offline();

    let output = env
        .cmd()
        .args(["preview", "--source", "stoic", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["event"], serde_json::json!("SessionStart"));
    assert_eq!(result["source"], serde_json::json!("stoic"));
    assert!(!result["message"].as_str().unwrap().is_empty());
}

#[test]
fn preview_rejects_unknown_event() {
    let env = TestEnv::offline();

    env.cmd()
        .args(["preview", "--event", "nonsense"])
        .assert()
        .failure();
}

#[test]
fn ratelimit_status_and_reset_roundtrip() {
    let env = TestEnv::offline();

    // Empty state
    env.cmd()
        .args(["ratelimit", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing on cooldown"));

    // Seed state the way the selector would
    std::fs::write(
        env.config_dir.path().join("last_shown.json"),
        serde_json::json!({"last_shown_daily_text": chrono::Utc::now().to_rfc3339()}).to_string(),
    )
    .unwrap();

    env.cmd()
        .args(["ratelimit", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("daily_text"));

    env.cmd()
        .args(["ratelimit", "reset", "daily_text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("daily_text"));

    env.cmd()
        .args(["ratelimit", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing on cooldown"));
}

#[test]
fn completions_generate_for_bash() {
    let env = TestEnv::new();

    env.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moodlift"));
}
