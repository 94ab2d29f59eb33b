//! A modem stand-in that reads a captured feed from a file or stdin.
//!
//! Used by `smsfwd preview` and tests. Deletion is not supported.

use std::path::PathBuf;

use async_trait::async_trait;
use smsfwd_core::error::ModemError;
use smsfwd_core::modem::ModemClient;
use tokio::io::AsyncReadExt;

/// Path value that selects standard input.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone)]
pub struct FeedFile {
    path: PathBuf,
    label: String,
}

impl FeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    pub fn stdin() -> Self {
        Self::new(STDIN_PATH)
    }

    fn is_stdin(&self) -> bool {
        self.label == STDIN_PATH
    }
}

#[async_trait]
impl ModemClient for FeedFile {
    fn port(&self) -> &str {
        &self.label
    }

    async fn fetch_feed(&self) -> Result<String, ModemError> {
        let feed = if self.is_stdin() {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| ModemError::CommandFailed {
                    port: self.label.clone(),
                    reason: format!("reading stdin: {e}"),
                })?;
            buf
        } else {
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| ModemError::CommandFailed {
                    port: self.label.clone(),
                    reason: e.to_string(),
                })?
        };

        if feed.trim().is_empty() {
            return Err(ModemError::EmptyFeed {
                port: self.label.clone(),
            });
        }
        Ok(feed)
    }

    async fn delete_message(&self, _index: i64) -> Result<(), ModemError> {
        Err(ModemError::Unsupported {
            port: self.label.clone(),
            operation: "delete",
        })
    }
}
