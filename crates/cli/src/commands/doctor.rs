//! `smsfwd doctor`: diagnose the runtime environment.

use std::path::{Path, PathBuf};

use smsfwd_config::AppConfig;
use smsfwd_forwarders::ForwarderEnv;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 smsfwd doctor: environment diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    let config = match AppConfig::load_from(config_path) {
        Ok(config) => {
            println!("  ✅ Config file valid ({})", config_path.display());
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running further checks.");
            return Ok(());
        }
    };

    // The AT tool every modem goes through
    match find_executable(&config.daemon.tom_modem_bin) {
        Some(path) => println!("  ✅ tom_modem found at {}", path.display()),
        None => {
            println!("  ❌ tom_modem not found ({})", config.daemon.tom_modem_bin);
            issues += 1;
        }
    }

    for modem in &config.modems {
        if Path::new(&modem.modem_port).exists() {
            println!("  ✅ Modem port {} exists", modem.modem_port);
        } else {
            println!("  ⚠️  Modem port {} does not exist", modem.modem_port);
            issues += 1;
        }
    }

    // Script forwarders report whether their script is present
    let env = ForwarderEnv::from_settings(&config.daemon)?;
    for modem in &config.modems {
        for spec in &modem.apis {
            match smsfwd_forwarders::build(spec, &env) {
                Ok(forwarder) => match forwarder.health_check().await {
                    Ok(true) => println!("  ✅ {} forwarder '{}' ready", modem.modem_port, forwarder.name()),
                    Ok(false) | Err(_) => {
                        println!(
                            "  ❌ {} forwarder '{}' not ready (missing script?)",
                            modem.modem_port,
                            forwarder.name()
                        );
                        issues += 1;
                    }
                },
                Err(e) => {
                    println!("  ❌ {} forwarder skipped: {e}", modem.modem_port);
                    issues += 1;
                }
            }
        }
    }

    // Helper scripts shell out to one of these
    for tool in ["curl", "wget"] {
        match find_executable(tool) {
            Some(path) => println!("  ℹ️  {tool} available at {}", path.display()),
            None => println!("  ℹ️  {tool} not installed"),
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Resolve `name` the way a shell would: paths are checked directly, bare
/// names are looked up on `PATH`.
fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return path.is_file().then_some(path);
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
