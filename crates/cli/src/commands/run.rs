//! `smsfwd run`: the polling daemon.

use std::path::Path;

use smsfwd_pipeline::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{forwarder_list, load_config};

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let scheduler = Scheduler::from_config(&config)?;

    println!("📨 smsfwd: starting SMS forwarder");
    println!("   Config:  {}", config_path.display());
    println!("   Tick:    {}s", scheduler.tick_period().as_secs());
    println!("   Modems:  {}", scheduler.endpoints().len());
    for endpoint in scheduler.endpoints() {
        let dispatcher = endpoint.dispatcher();
        println!(
            "   • {} every {}s, {} forwarder(s) [{}], delete after forward: {}",
            endpoint.port(),
            endpoint.poll_interval().as_secs(),
            dispatcher.len(),
            forwarder_list(&dispatcher.names()),
            if endpoint.delete_after_forward() { "yes" } else { "no" }
        );
        if dispatcher.is_empty() {
            println!("     ⚠️  no usable forwarder; messages will stay on the modem");
        }
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    scheduler.run(shutdown).await;

    info!("smsfwd stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupt received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
    shutdown.cancel();
}
