//! Binary-level tests: argument handling, exit codes and operator output.

mod common;

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use common::{REFUSED_URL, StubServer};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }

    fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &serde_json::to_string_pretty(value).expect("serialize"))
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn status_notify() -> Command {
    let mut cmd = Command::cargo_bin("status-notify").expect("binary should build");
    cmd.env_remove("STATUS_NOTIFY_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn run(config: &Path, events: &Path, extra: &[&str]) -> std::process::Output {
    status_notify()
        .arg("--config")
        .arg(config)
        .arg("--events")
        .arg(events)
        .args(extra)
        .output()
        .expect("run binary")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod usage_tests {
    use super::*;

    #[test]
    fn test_help_exits_zero() {
        let output = status_notify().arg("--help").output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("--config"));
        assert!(stdout(&output).contains("--dry-run"));
    }

    #[test]
    fn test_version_exits_zero() {
        let output = status_notify().arg("--version").output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_missing_config_flag_exits_one() {
        let output = status_notify().output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("--config"));
    }

    #[test]
    fn test_missing_config_file_exits_one() {
        let ws = Workspace::new();
        let output = run(&ws.path("nope.json"), &ws.path("events.json"), &[]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Configuration file not found"));
    }
}

mod run_tests {
    use super::*;

    #[test]
    fn test_absent_events_file_sends_nothing() {
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({"channels": {"webhook": {"enabled": true, "url": REFUSED_URL}}}),
        );

        let output = run(&config, &ws.path("events.json"), &[]);

        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout(&output), "Sent 0 notification(s) successfully\n");
    }

    #[test]
    fn test_successful_delivery_exits_zero() {
        let hook = StubServer::start(200, "{}");
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({"channels": {"status-hook": {"enabled": true, "type": "webhook", "url": hook.url("/in")}}}),
        );
        let events = ws.write_json(
            "events.json",
            &json!([{"service": "api", "state": "down"}, {"service": "web", "state": "up"}]),
        );

        let output = run(&config, &events, &[]);

        assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "Sent 2 notification(s) successfully\n");
        assert_eq!(hook.requests().len(), 2);
    }

    #[test]
    fn test_failures_exit_one_with_redacted_details() {
        let good = StubServer::start(200, "{}");
        let bad = StubServer::start(403, "forbidden");
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({
                "channels": {
                    "good": {"enabled": true, "type": "webhook", "url": good.url("/in")},
                    "bad": {
                        "enabled": true,
                        "type": "webhook",
                        "url": bad.url("/in"),
                        "headers": {"Authorization": "env:HOOK_TOKEN"}
                    },
                    "gone": {"enabled": true, "type": "webhook", "url": REFUSED_URL}
                }
            }),
        );
        let events = ws.write_json("events.json", &json!({"service": "api", "state": "down"}));

        let output = status_notify()
            .arg("--config")
            .arg(&config)
            .arg("--events")
            .arg(&events)
            .arg("--verbose")
            .env("HOOK_TOKEN", "Bearer s3cr3t-value")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("Enabled channels: good, bad, gone"));
        assert!(out.contains("Sent 1 notification(s) successfully"));
        assert!(out.contains("2 notification(s) failed"));
        assert!(out.contains("  - bad: HTTP 403: forbidden"));
        assert!(out.contains("  - gone: "));
        assert!(!out.contains("s3cr3t-value"));
        assert!(!stderr(&output).contains("s3cr3t-value"));

        assert_eq!(bad.requests()[0].header("authorization"), Some("Bearer s3cr3t-value"));
    }

    #[test]
    fn test_slack_webhook_from_env_with_one_failure() {
        let slack = StubServer::start(200, "ok");
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({
                "channels": {
                    "slack": {"enabled": true, "webhookUrl": "env:SLACK_URL"},
                    "ops-slack": {"enabled": true, "type": "slack", "webhookUrl": REFUSED_URL}
                }
            }),
        );
        let events = ws.write_json("events.json", &json!([{"service": "api", "state": "down"}]));

        let output = status_notify()
            .arg("--config")
            .arg(&config)
            .arg("--events")
            .arg(&events)
            .env("SLACK_URL", slack.url("/services/T000/B000/XXXX"))
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert_eq!(
            stdout(&output),
            "Sent 1 notification(s) successfully\n1 notification(s) failed\n"
        );

        let received = slack.requests();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].path, "/services/T000/B000/XXXX");
        assert!(received[0].json()["text"].is_string());
    }

    #[test]
    fn test_failure_details_hidden_without_verbose() {
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({"channels": {"gone": {"enabled": true, "type": "webhook", "url": REFUSED_URL}}}),
        );
        let events = ws.write_json("events.json", &json!([{"service": "api"}]));

        let output = run(&config, &events, &["--quiet"]);

        assert_eq!(output.status.code(), Some(1));
        assert_eq!(
            stdout(&output),
            "Sent 0 notification(s) successfully\n1 notification(s) failed\n"
        );
    }

    #[test]
    fn test_dry_run_sends_nothing() {
        let hook = StubServer::start(200, "{}");
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({
                "channels": {
                    "hook": {"enabled": true, "type": "webhook", "url": hook.url("/in")},
                    "telegram": {"enabled": true, "botToken": "env:BOT_TOKEN", "chatId": "7"}
                }
            }),
        );
        let events = ws.write_json(
            "events.json",
            &json!([
                {"service": "api", "state": "down"},
                {"service": "web", "state": "up"}
            ]),
        );

        let output = status_notify()
            .arg("--config")
            .arg(&config)
            .arg("--events")
            .arg(&events)
            .arg("--dry-run")
            .env("BOT_TOKEN", "999:dry-run-secret-token")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(0));
        let out = stdout(&output);
        assert!(out.contains("Dry run: 2 event(s), 2 enabled channel(s)"));
        assert!(out.contains("\"web\""));
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("dry-run-secret-token"));
        assert!(!out.contains("Sent "));
        assert!(hook.requests().is_empty());
    }
}

mod env_tests {
    use super::*;

    #[test]
    fn test_missing_env_var_exits_one() {
        let ws = Workspace::new();
        let config = ws.write_json(
            "notify.json",
            &json!({"channels": {"slack": {"enabled": true, "webhookUrl": "env:STATUS_NOTIFY_TEST_UNSET"}}}),
        );

        let output = status_notify()
            .arg("--config")
            .arg(&config)
            .env_remove("STATUS_NOTIFY_TEST_UNSET")
            .current_dir(ws.dir.path())
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Missing environment variable: STATUS_NOTIFY_TEST_UNSET"));
        assert!(stdout(&output).is_empty());
    }

    #[test]
    fn test_env_file_supplies_variables() {
        let hook = StubServer::start(200, "{}");
        let ws = Workspace::new();
        let env_file = ws.write(".env.test", &format!("HOOK_URL={}\n", hook.url("/from-env")));
        let config = ws.write_json(
            "notify.json",
            &json!({"channels": {"hook": {"enabled": true, "type": "webhook", "url": "env:HOOK_URL"}}}),
        );
        let events = ws.write_json("events.json", &json!([{"service": "api"}]));

        let output = status_notify()
            .arg("--config")
            .arg(&config)
            .arg("--events")
            .arg(&events)
            .arg("--env-file")
            .arg(&env_file)
            .env_remove("HOOK_URL")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
        assert_eq!(hook.requests()[0].path, "/from-env");
    }

    #[test]
    fn test_malformed_events_exit_one() {
        let ws = Workspace::new();
        let config = ws.write_json("notify.json", &json!({"channels": {}}));
        let events = ws.write("events.json", "[{\"service\": ");

        let output = run(&config, &events, &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Failed to parse events file"));
    }
}
