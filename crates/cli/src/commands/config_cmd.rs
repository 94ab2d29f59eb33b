//! `smsfwd config`: configuration management commands.

use std::path::Path;

use smsfwd_config::AppConfig;
use smsfwd_forwarders::{BUILTIN_TYPES, ForwarderEnv};

use super::forwarder_list;

pub async fn validate(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating {}...", config_path.display());

    let config = match AppConfig::load_from(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            config
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };

    // Build every forwarder to surface missing keys before the daemon does
    let env = ForwarderEnv::from_settings(&config.daemon)?;
    let mut warnings = Vec::new();
    for modem in &config.modems {
        if modem.apis.is_empty() {
            warnings.push(format!(
                "{}: no forwarders configured, messages will never be deleted",
                modem.modem_port
            ));
        }
        for spec in &modem.apis {
            if let Err(e) = smsfwd_forwarders::build(spec, &env) {
                warnings.push(format!("{}: {e}", modem.modem_port));
            } else if !BUILTIN_TYPES.contains(&spec.kind.trim().to_ascii_lowercase().as_str()) {
                warnings.push(format!(
                    "{}: '{}' is handled by {}/sms_forward_{}.sh",
                    modem.modem_port,
                    spec.kind,
                    config.daemon.script_dir,
                    spec.kind.trim().to_ascii_lowercase()
                ));
            }
        }
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Modems:    {}", config.modems.len());
    println!("   Tick:      {}s", config.min_poll_interval());
    println!("   tom_modem: {}", config.daemon.tom_modem_bin);
    for modem in &config.modems {
        let kinds: Vec<&str> = modem.apis.iter().map(|a| a.kind.as_str()).collect();
        println!(
            "   • {} every {}s → {}",
            modem.modem_port,
            modem.poll_interval,
            forwarder_list(&kinds)
        );
    }

    Ok(())
}

pub async fn show(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_from(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.to_toml_string()?);
    Ok(())
}
