//! Configuration loading, normalization and validation for smsfwd.
//!
//! The daemon reads one configuration file given on the command line. JSON
//! files may use any of the shapes the router UI has written over time:
//!
//! - an array of modem entries (current shape),
//! - an object with a `modems` array and an optional `daemon` table,
//! - a flat legacy object describing one modem with one forwarder.
//!
//! `.toml` files use the `modems`/`daemon` shape. All of them normalize into
//! the same [`AppConfig`], which is validated before it is returned.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Default poll interval for a modem, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Process-wide daemon settings
    #[serde(default)]
    pub daemon: DaemonSettings,

    /// Modems to poll, in configuration order
    #[serde(default)]
    pub modems: Vec<ModemConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// AT tool used to read and delete messages
    #[serde(default = "default_tom_modem_bin")]
    pub tom_modem_bin: String,

    /// Directory holding `sms_forward_<type>.sh` helper scripts
    #[serde(default = "default_script_dir")]
    pub script_dir: String,

    #[serde(default = "default_fetch_timeout", deserialize_with = "lenient_u64")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_delete_timeout", deserialize_with = "lenient_u64")]
    pub delete_timeout_secs: u64,

    #[serde(default = "default_forward_timeout", deserialize_with = "lenient_u64")]
    pub forward_timeout_secs: u64,
}

fn default_tom_modem_bin() -> String {
    "tom_modem".into()
}
fn default_script_dir() -> String {
    "/usr/bin".into()
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_delete_timeout() -> u64 {
    15
}
fn default_forward_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            tom_modem_bin: default_tom_modem_bin(),
            script_dir: default_script_dir(),
            fetch_timeout_secs: default_fetch_timeout(),
            delete_timeout_secs: default_delete_timeout(),
            forward_timeout_secs: default_forward_timeout(),
        }
    }
}

/// One modem and the forwarders its messages go to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    /// AT port of the modem (e.g. `/dev/ttyUSB2`)
    #[serde(default)]
    pub modem_port: String,

    /// Seconds between polls
    #[serde(default = "default_poll_interval", deserialize_with = "lenient_u64")]
    pub poll_interval: u64,

    /// Delete message parts from the modem once at least one forwarder succeeded
    #[serde(default, deserialize_with = "lenient_bool")]
    pub delete_after_forward: bool,

    /// Delivery targets, in configuration order
    #[serde(default)]
    pub apis: Vec<ForwarderSpec>,
}

/// One delivery target: a type tag plus a free-form config blob.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwarderSpec {
    #[serde(rename = "api_type", default)]
    pub kind: String,

    #[serde(
        rename = "api_config",
        default = "empty_config",
        deserialize_with = "api_config_value"
    )]
    pub config: serde_json::Value,
}

/// Keys whose values never show up in logs or `config show`.
const SECRET_KEY_MARKERS: [&str; 5] = ["token", "key", "secret", "password", "headers"];

impl ForwarderSpec {
    pub fn new(kind: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            config,
        }
    }

    /// String value of a config key, if present and non-empty.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The config blob with secret-looking values replaced and `null`
    /// entries removed (TOML has no null).
    pub fn redacted_config(&self) -> serde_json::Value {
        match &self.config {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| {
                        let lower = k.to_ascii_lowercase();
                        if SECRET_KEY_MARKERS.iter().any(|m| lower.contains(m)) {
                            (k.clone(), serde_json::Value::String("[REDACTED]".into()))
                        } else {
                            (k.clone(), without_nulls(v))
                        }
                    })
                    .collect(),
            ),
            other => without_nulls(other),
        }
    }
}

fn without_nulls(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().filter(|v| !v.is_null()).map(without_nulls).collect())
        }
        other => other.clone(),
    }
}

impl std::fmt::Debug for ForwarderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwarderSpec")
            .field("kind", &self.kind)
            .field("config", &self.redacted_config())
            .finish()
    }
}

/// The flat single-modem shape written by older releases.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(default)]
    modem_port: String,

    #[serde(default = "default_poll_interval", deserialize_with = "lenient_u64")]
    poll_interval: u64,

    #[serde(default)]
    api_type: String,

    #[serde(default = "empty_config", deserialize_with = "api_config_value")]
    api_config: serde_json::Value,

    #[serde(default, deserialize_with = "lenient_bool")]
    delete_after_forward: bool,
}

impl From<LegacyConfig> for AppConfig {
    fn from(legacy: LegacyConfig) -> Self {
        Self {
            daemon: DaemonSettings::default(),
            modems: vec![ModemConfig {
                modem_port: legacy.modem_port,
                poll_interval: legacy.poll_interval,
                delete_after_forward: legacy.delete_after_forward,
                apis: vec![ForwarderSpec::new(legacy.api_type, legacy.api_config)],
            }],
        }
    }
}

impl AppConfig {
    /// Load configuration from a file.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed = if is_toml {
            Self::parse_toml(&content)
        } else {
            Self::parse_json(&content)
        };

        let config = parsed.map_err(|e| match e {
            ConfigError::Syntax(reason) => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::debug!(
            path = %path.display(),
            modems = config.modems.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a JSON configuration document.
    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        let root: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        Self::from_value(root)
    }

    /// Parse and validate a TOML configuration document.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Value =
            toml::from_str(content).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        let root = serde_json::to_value(table).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        Self::from_value(root)
    }

    fn from_value(root: serde_json::Value) -> Result<Self, ConfigError> {
        let syntax = |e: serde_json::Error| ConfigError::Syntax(e.to_string());

        let config = match root {
            serde_json::Value::Array(_) => Self {
                daemon: DaemonSettings::default(),
                modems: serde_json::from_value(root).map_err(syntax)?,
            },
            serde_json::Value::Object(ref map) if map.contains_key("modems") => {
                serde_json::from_value(root).map_err(syntax)?
            }
            serde_json::Value::Object(_) => {
                tracing::info!("Legacy single-modem configuration detected, normalizing");
                let legacy: LegacyConfig = serde_json::from_value(root).map_err(syntax)?;
                legacy.into()
            }
            _ => {
                return Err(ConfigError::Syntax(
                    "configuration root must be an object or an array".into(),
                ));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modems.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one modem must be configured".into(),
            ));
        }

        for (i, modem) in self.modems.iter().enumerate() {
            if modem.modem_port.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "modem #{} has no modem_port",
                    i + 1
                )));
            }
            if modem.poll_interval == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "modem {}: poll_interval must be at least 1 second",
                    modem.modem_port
                )));
            }
            if let Some(j) = modem.apis.iter().position(|a| a.kind.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "modem {}: forwarder #{} has no api_type",
                    modem.modem_port,
                    j + 1
                )));
            }
        }

        let d = &self.daemon;
        if d.fetch_timeout_secs == 0 || d.delete_timeout_secs == 0 || d.forward_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "daemon timeouts must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    /// The shortest poll interval across all modems; the scheduler tick period.
    pub fn min_poll_interval(&self) -> u64 {
        self.modems
            .iter()
            .map(|m| m.poll_interval)
            .min()
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
            .max(1)
    }

    /// A copy safe to print: forwarder secrets are redacted.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for modem in &mut config.modems {
            for api in &mut modem.apis {
                api.config = api.redacted_config();
            }
        }
        config
    }

    /// Render the normalized configuration as TOML (secrets redacted).
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| ConfigError::Render(e.to_string()))
    }
}

// ── Lenient scalar decoding ─────────────────────────────────────────────────
//
// The router UI stores every option as a string, so numbers and flags arrive
// as `"30"` or `"1"` just as often as `30` or `true`.

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => u64::from(b),
        Scalar::Int(i) => u64::try_from(i).unwrap_or(0),
        Scalar::Float(f) if f > 0.0 => f as u64,
        Scalar::Float(_) => 0,
        Scalar::Text(s) => s.trim().parse().unwrap_or(0),
    };
    Ok(value)
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b,
        Scalar::Int(i) => i != 0,
        Scalar::Float(f) => f != 0.0,
        Scalar::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    };
    Ok(value)
}

/// `api_config` is either an object or a string holding JSON.
fn api_config_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<serde_json::Value, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => empty_config(),
        serde_json::Value::String(s) => match serde_json::from_str(&s) {
            Ok(parsed @ serde_json::Value::Object(_)) => parsed,
            _ => serde_json::Value::String(s),
        },
        other => other,
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Syntax(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to render configuration: {0}")]
    Render(String),
}
