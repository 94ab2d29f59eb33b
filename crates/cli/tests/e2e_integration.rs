//! End-to-end tests for the smsfwd binary.
//!
//! These run the real executable against a fake `tom_modem` (a shell
//! script) and an in-process HTTP endpoint standing in for a webhook.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use tokio::process::Command;

const FEED: &str = r#"{"msg":[
    {"index":3,"sender":"10086","timestamp":1700000000,"content":"Balance 12.30","total":1},
    {"index":8,"sender":"+8613800000000","timestamp":1700000050,"content":"World","reference":42,"total":2,"part":2},
    {"index":7,"sender":"+8613800000000","timestamp":1700000049,"content":"Hello ","reference":42,"total":2,"part":1},
    {"index":9,"sender":"95588","timestamp":1700000060,"content":"1/3","reference":5,"total":3,"part":1}
]}"#;

async fn smsfwd(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_smsfwd"))
        .args(args)
        .env_remove("SMSFWD_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .await
        .unwrap()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ── preview ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_reassembles_a_captured_feed() {
    let dir = tempfile::tempdir().unwrap();
    let feed = write(dir.path(), "feed.json", FEED);

    let output = smsfwd(&["preview", feed.to_str().unwrap()]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("4 part(s), 2 message(s)"));
    assert!(out.contains("Balance 12.30"));
    assert!(out.contains("Hello World"));
    assert!(out.contains("indices [7, 8]"));
    assert!(out.contains("incomplete: 95588/5/3 has 1 of 3 part(s)"));
}

#[tokio::test]
async fn preview_rejects_malformed_feed() {
    let dir = tempfile::tempdir().unwrap();
    let feed = write(dir.path(), "feed.json", r#"{"status":"ok"}"#);

    let output = smsfwd(&["preview", feed.to_str().unwrap()]).await;

    assert!(!output.status.success());
}

// ── config ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn config_validate_accepts_legacy_shape() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "legacy.json",
        r#"{"modem_port":"/dev/ttyUSB2","poll_interval":"15","api_type":"tgbot",
            "api_config":"{\"bot_token\":\"1:abc\",\"chat_id\":\"42\"}","delete_after_forward":"1"}"#,
    );

    let output = smsfwd(&["config", "validate", config.to_str().unwrap()]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("All checks passed"));
    assert!(out.contains("/dev/ttyUSB2 every 15s → tgbot"));
}

#[tokio::test]
async fn config_validate_fails_on_empty_modem_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "empty.json", "[]");

    let output = smsfwd(&["config", "validate", config.to_str().unwrap()]).await;

    assert!(!output.status.success());
    assert!(stdout(&output).contains("Config error"));
}

#[tokio::test]
async fn config_show_redacts_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "modems.json",
        r#"[{"modem_port":"/dev/ttyUSB2","apis":[
            {"api_type":"pushdeer","api_config":{"pushkey":"PDU-very-secret"}}
        ]}]"#,
    );

    let output = smsfwd(&["config", "show", config.to_str().unwrap()]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("modem_port = \"/dev/ttyUSB2\""));
    assert!(out.contains("[REDACTED]"));
    assert!(!out.contains("PDU-very-secret"));
}

#[tokio::test]
async fn config_path_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "modems.json", r#"[{"modem_port":"/dev/ttyUSB2"}]"#);

    let output = Command::new(env!("CARGO_BIN_EXE_smsfwd"))
        .args(["config", "validate"])
        .env("SMSFWD_CONFIG", &config)
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
}

// ── once ─────────────────────────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn once_forwards_through_webhook_and_deletes() {
    use std::os::unix::fs::PermissionsExt;

    // Webhook endpoint recording request bodies
    let bodies: Arc<Mutex<Vec<String>>> = Arc::default();
    let app = Router::new()
        .fallback(|State(bodies): State<Arc<Mutex<Vec<String>>>>, body: String| async move {
            bodies.lock().unwrap().push(body);
            StatusCode::OK
        })
        .with_state(bodies.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    // Fake tom_modem: list prints the feed, delete appends the index to a log
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "feed.json", FEED);
    let deleted_log = dir.path().join("deleted.log");
    let tool = write(
        dir.path(),
        "tom_modem",
        &format!(
            "#!/bin/sh\ncase \"$5\" in\n  u) cat {feed} ;;\n  d) echo \"$7\" >> {log} ;;\nesac\n",
            feed = dir.path().join("feed.json").display(),
            log = deleted_log.display(),
        ),
    );
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = serde_json::json!({
        "daemon": { "tom_modem_bin": tool.to_str().unwrap() },
        "modems": [{
            "modem_port": "/dev/ttyUSB2",
            "poll_interval": 5,
            "delete_after_forward": true,
            "apis": [{
                "api_type": "webhook",
                "api_config": {
                    "webhook_url": format!("http://{addr}/sms"),
                    "request_method": "POST"
                }
            }]
        }]
    });
    let config_path = write(dir.path(), "smsfwd.json", &config.to_string());

    let output = smsfwd(&["once", config_path.to_str().unwrap()]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains("✅ /dev/ttyUSB2"));
    assert!(out.contains("Messages:   2 (2 delivered)"));

    let bodies = bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    let second: serde_json::Value = serde_json::from_str(&bodies[1]).unwrap();
    assert_eq!(second["sender"], "+8613800000000");
    assert_eq!(second["content"], "Hello World");

    let deleted = std::fs::read_to_string(deleted_log).unwrap();
    assert_eq!(deleted.lines().collect::<Vec<_>>(), vec!["3", "7", "8"]);
}
