mod common;

use common::TestEnv;
use predicates::prelude::*;

fn stdin_for(event: &str) -> String {
    serde_json::json!({
        "hook_event_name": event,
        "session_id": "test-session",
    })
    .to_string()
}

#[test]
fn session_start_emits_json_envelope() {
    let env = TestEnv::offline();

    let output = env
        .cmd()
        .args(["hook", "session-start"])
        .write_stdin(stdin_for("SessionStart"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("SessionStart output must be JSON");
    assert_eq!(parsed["suppressOutput"], serde_json::json!(true));
    let message = parsed["systemMessage"].as_str().unwrap();
    assert!(!message.is_empty());
}

#[test]
fn stop_emits_plain_text_message() {
    let env = TestEnv::offline();

    let output = env
        .cmd()
        .args(["hook", "stop"])
        .write_stdin(stdin_for("Stop"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert!(!stdout.trim().is_empty());
    // Plain text, not a JSON envelope
    assert!(serde_json::from_str::<serde_json::Value>(stdout.trim()).is_err());
}

#[test]
fn stop_hook_active_stays_silent() {
    let env = TestEnv::offline();

    let stdin = serde_json::json!({
        "hook_event_name": "Stop",
        "session_id": "test-session",
        "stop_hook_active": true,
    })
    .to_string();

    env.cmd()
        .args(["hook", "stop"])
        .write_stdin(stdin)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn mismatched_event_name_is_silent_success() {
    let env = TestEnv::offline();

    env.cmd()
        .args(["hook", "stop"])
        .write_stdin(stdin_for("PreToolUse"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn malformed_stdin_still_exits_zero() {
    let env = TestEnv::offline();

    env.cmd()
        .args(["hook", "stop"])
        .write_stdin("this is not json {{{")
        .assert()
        .success();
}

#[test]
fn notification_responds_to_waiting_messages() {
    let env = TestEnv::offline();

    let stdin = serde_json::json!({
        "hook_event_name": "Notification",
        "message": "Claude is waiting for your input",
    })
    .to_string();

    let output = env
        .cmd()
        .args(["hook", "notification"])
        .write_stdin(stdin)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(output).unwrap().trim().is_empty());
}

#[test]
fn notification_ignores_other_messages() {
    let env = TestEnv::offline();

    let stdin = serde_json::json!({
        "hook_event_name": "Notification",
        "message": "Task completed successfully",
    })
    .to_string();

    env.cmd()
        .args(["hook", "notification"])
        .write_stdin(stdin)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn probability_zero_gates_everything_off() {
    let env = TestEnv::new();
    env.write_config(
        r#"
[sources.weights]
default = 100

[sources.external]
enabled = false

[sources.scripture]
enabled = false

[enhancer]
enabled = false

[events.stop]
probability = 0.0
"#,
    );

    env.cmd()
        .args(["hook", "stop"])
        .write_stdin(stdin_for("Stop"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn disabled_event_stays_silent() {
    let env = TestEnv::new();
    env.write_config(
        r#"
[sources.weights]
default = 100

[sources.external]
enabled = false

[sources.scripture]
enabled = false

[enhancer]
enabled = false

[events.session_start]
enabled = false
"#,
    );

    env.cmd()
        .args(["hook", "session-start"])
        .write_stdin(stdin_for("SessionStart"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn master_switch_disables_all_events() {
    let env = TestEnv::new();
    env.write_config(
        r#"
enabled = false

[enhancer]
enabled = false
"#,
    );

    for (subcommand, event) in [
        ("session-start", "SessionStart"),
        ("stop", "Stop"),
        ("notification", "Notification"),
    ] {
        env.cmd()
            .args(["hook", subcommand])
            .write_stdin(stdin_for(event))
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}
