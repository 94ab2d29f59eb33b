pub mod config_cmd;
pub mod doctor;
pub mod once;
pub mod preview;
pub mod run;

use std::path::Path;

use smsfwd_config::AppConfig;

/// Load and validate the configuration, with the path in the error message.
pub fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_from(path)
        .map_err(|e| format!("Failed to load config {}: {e}", path.display()).into())
}

/// One-line summary of a modem's forwarders, e.g. `webhook, tgbot`.
pub fn forwarder_list(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
