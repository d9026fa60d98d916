//! Terminal output for run results.

use anyhow::Error;
use legged_harness::RunSummary;

/// Print an error and its cause chain.
pub fn print_error(error: &Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Print the end-of-run report.
pub fn print_summary(summary: &RunSummary) {
    println!("Stopped: {:?}", summary.reason);
    println!(
        "Cycles: {} ({} overrun, {} failed)",
        summary.cycles, summary.overruns, summary.failed_cycles
    );
    println!(
        "Drift: p50 {} us, p99 {} us, max {} us",
        summary.drift.p50_ns / 1_000,
        summary.drift.p99_ns / 1_000,
        summary.drift.max_ns / 1_000
    );
    println!(
        "Sessions: {} opened, {} saved, {} failed, {} discarded",
        summary.sessions.opened,
        summary.sessions.saved,
        summary.sessions.failed,
        summary.sessions.discarded
    );
    if let Some(path) = &summary.final_save {
        println!("Last session: {}", path.display());
    }
}
