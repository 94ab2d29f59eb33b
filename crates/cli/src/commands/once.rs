//! `smsfwd once`: a single poll cycle over every modem.

use std::path::Path;

use smsfwd_pipeline::{CycleOutcome, CycleReport, Scheduler};

use super::load_config;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let scheduler = Scheduler::from_config(&config)?;

    println!("📨 smsfwd: polling {} modem(s) once\n", scheduler.endpoints().len());

    let reports = scheduler.run_tick().await;
    for report in &reports {
        print_report(report);
    }

    let missing = scheduler.endpoints().len() - reports.len();
    if missing > 0 {
        println!("  ❌ {missing} modem cycle(s) aborted, see log");
    }

    Ok(())
}

fn print_report(report: &CycleReport) {
    match &report.outcome {
        CycleOutcome::Completed => println!("  ✅ {}", report.port),
        CycleOutcome::FetchFailed(e) => {
            println!("  ❌ {}: {e}", report.port);
            return;
        }
        CycleOutcome::MalformedFeed(e) => {
            println!("  ❌ {}: {e}", report.port);
            return;
        }
    }

    println!("     Parts:      {}", report.parts);
    println!(
        "     Messages:   {} ({} delivered)",
        report.messages, report.delivered
    );
    if report.incomplete_groups > 0 {
        println!(
            "     Incomplete: {} multi-part group(s) waiting for more parts",
            report.incomplete_groups
        );
    }
    if report.forward_failures > 0 {
        println!("     ⚠️  {} forwarder call(s) failed", report.forward_failures);
    }
    if !report.deleted.is_empty() {
        println!("     Deleted:    {:?}", report.deleted);
    }
    if !report.delete_failures.is_empty() {
        println!("     ⚠️  Delete failed for {:?}", report.delete_failures);
    }
}
