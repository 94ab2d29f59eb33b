//! `tom_modem` client: reads and deletes stored SMS through the AT tool.
//!
//! Every call spawns the tool with an explicit argument vector (no shell) and
//! is bounded by a timeout; a timed-out child is killed.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use smsfwd_core::error::ModemError;
use smsfwd_core::modem::ModemClient;
use tokio::process::Command;
use tracing::{debug, warn};

/// A modem reached through the `tom_modem` command-line tool.
#[derive(Debug, Clone)]
pub struct TomModemClient {
    port: String,
    binary: String,
    fetch_timeout: Duration,
    delete_timeout: Duration,
}

impl TomModemClient {
    pub fn new(port: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            binary: binary.into(),
            fetch_timeout: Duration::from_secs(30),
            delete_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeouts(mut self, fetch: Duration, delete: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.delete_timeout = delete;
        self
    }

    fn fetch_args(&self) -> Vec<String> {
        vec![
            "-d".into(),
            self.port.clone(),
            "-u".into(),
            "-o".into(),
            "u".into(),
        ]
    }

    fn delete_args(&self, index: i64) -> Vec<String> {
        vec![
            "-d".into(),
            self.port.clone(),
            "-u".into(),
            "-o".into(),
            "d".into(),
            "-i".into(),
            index.to_string(),
        ]
    }

    async fn run(
        &self,
        args: Vec<String>,
        timeout: Duration,
        operation: &'static str,
    ) -> Result<std::process::Output, ModemError> {
        debug!(port = %self.port, binary = %self.binary, ?args, "Running modem command");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ModemError::CommandFailed {
                port: self.port.clone(),
                reason: format!("{}: {e}", self.binary),
            }),
            Err(_) => Err(ModemError::Timeout {
                port: self.port.clone(),
                operation,
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ModemClient for TomModemClient {
    fn port(&self) -> &str {
        &self.port
    }

    async fn fetch_feed(&self) -> Result<String, ModemError> {
        let output = self
            .run(self.fetch_args(), self.fetch_timeout, "fetch")
            .await?;

        if !output.status.success() {
            debug!(
                port = %self.port,
                exit_code = output.status.code().unwrap_or(-1),
                "tom_modem exited non-zero while listing messages"
            );
        }

        let feed = String::from_utf8_lossy(&output.stdout).into_owned();
        if feed.trim().is_empty() {
            return Err(ModemError::EmptyFeed {
                port: self.port.clone(),
            });
        }
        Ok(feed)
    }

    async fn delete_message(&self, index: i64) -> Result<(), ModemError> {
        let output = self
            .run(self.delete_args(index), self.delete_timeout, "delete")
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(port = %self.port, index, exit_code = code, "tom_modem delete failed");
            Err(ModemError::DeleteFailed {
                port: self.port.clone(),
                index,
                reason: format!("exit code {code}: {}", stderr.trim()),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Write an executable shell script standing in for `tom_modem`.
    fn fake_tool(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("tom_modem");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn client(tool: &PathBuf) -> TomModemClient {
        TomModemClient::new("/dev/ttyUSB2", tool.to_string_lossy())
    }

    #[test]
    fn argument_vectors() {
        let c = TomModemClient::new("/dev/ttyUSB2", "tom_modem");
        assert_eq!(c.fetch_args(), vec!["-d", "/dev/ttyUSB2", "-u", "-o", "u"]);
        assert_eq!(
            c.delete_args(7),
            vec!["-d", "/dev/ttyUSB2", "-u", "-o", "d", "-i", "7"]
        );
    }

    #[tokio::test]
    async fn fetch_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(&dir, r#"echo '{"msg":[]}'"#);
        let feed = client(&tool).fetch_feed().await.unwrap();
        assert_eq!(feed.trim(), r#"{"msg":[]}"#);
    }

    #[tokio::test]
    async fn fetch_passes_port_and_list_flags() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(&dir, r#"echo "$@""#);
        let feed = client(&tool).fetch_feed().await.unwrap();
        assert_eq!(feed.trim(), "-d /dev/ttyUSB2 -u -o u");
    }

    #[tokio::test]
    async fn empty_output_is_empty_feed() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(&dir, "exit 0");
        let err = client(&tool).fetch_feed().await.unwrap_err();
        assert!(matches!(err, ModemError::EmptyFeed { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_command_failure() {
        let c = TomModemClient::new("/dev/ttyUSB2", "/nonexistent/tom_modem");
        let err = c.fetch_feed().await.unwrap_err();
        assert!(matches!(err, ModemError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn delete_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        // Succeeds for index 5 only
        let tool = fake_tool(&dir, r#"[ "$7" = "5" ] || { echo "no such slot" >&2; exit 1; }"#);
        let c = client(&tool);
        assert!(c.delete_message(5).await.is_ok());

        let err = c.delete_message(6).await.unwrap_err();
        match err {
            ModemError::DeleteFailed { index, reason, .. } => {
                assert_eq!(index, 6);
                assert!(reason.contains("no such slot"));
            }
            other => panic!("expected DeleteFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(&dir, "sleep 5");
        let c = client(&tool).with_timeouts(Duration::from_millis(200), Duration::from_secs(1));
        let err = c.fetch_feed().await.unwrap_err();
        assert!(matches!(err, ModemError::Timeout { operation: "fetch", .. }));
    }
}
