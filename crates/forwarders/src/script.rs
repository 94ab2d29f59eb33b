//! Script forwarders: hand the message to a local executable.
//!
//! The message travels in the environment (`SMS_SENDER`, `SMS_TIME`,
//! `SMS_CONTENT`), built fresh for every invocation. Exit status 0 means
//! delivered. The script is spawned directly, never through a shell.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs an executable per message.
#[derive(Debug, Clone)]
pub struct ScriptForwarder {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ScriptForwarder {
    /// A user-supplied script (`custom` / `custom_script`), taken from
    /// the `script_path` key.
    pub fn custom(spec: &ForwarderSpec) -> Result<Self, ForwardError> {
        let name = spec.kind.trim().to_ascii_lowercase();
        let path = spec
            .get_str("script_path")
            .ok_or_else(|| ForwardError::invalid_config(&name, "missing script_path"))?;
        Ok(Self {
            name,
            program: PathBuf::from(path),
            args: Vec::new(),
        })
    }

    /// A packaged helper `<script_dir>/sms_forward_<type>.sh`, invoked with
    /// the forwarder's config serialized as one JSON argument.
    pub fn helper(spec: &ForwarderSpec, script_dir: &Path) -> Result<Self, ForwardError> {
        let name = spec.kind.trim().to_ascii_lowercase();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ForwardError::UnsupportedType(spec.kind.clone()));
        }
        let program = script_dir.join(format!("sms_forward_{name}.sh"));
        Ok(Self {
            name,
            program,
            args: vec![spec.config.to_string()],
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Forwarder for ScriptForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        debug!(forwarder = %self.name, program = %self.program.display(), "Running forward script");

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(ctx.env_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ForwardError::delivery(
                    &self.name,
                    format!("cannot run {}: {e}", self.program.display()),
                )
            })?;

        if output.status.success() {
            return Ok(());
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(forwarder = %self.name, exit_code = code, "Forward script failed");
        Err(ForwardError::delivery(
            &self.name,
            format!("exit code {code}: {}", stderr.trim()),
        ))
    }

    async fn health_check(&self) -> Result<bool, ForwardError> {
        Ok(tokio::fs::metadata(&self.program)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }
}
