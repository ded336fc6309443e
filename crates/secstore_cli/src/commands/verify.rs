//! Verify command implementation.

use super::open_store;
use secstore_core::{EntryOutcome, ScanMode};
use std::path::Path;

/// Runs the verify command.
///
/// Walks the directory index validating every object; contents are not
/// printed. The command fails if any entry fails, so the exit status is
/// usable from provisioning scripts.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying store at {}", path.display());
    println!();

    let store = open_store(path)?;
    let report = store.scan(ScanMode::Verify)?;
    store.close()?;

    for entry in &report.entries {
        match &entry.outcome {
            EntryOutcome::Valid { .. } => println!("  ok      {}", entry.name),
            EntryOutcome::Skipped => println!("  skip    {}", entry.name),
            EntryOutcome::Failed { reason } => println!("  FAIL    {} - {reason}", entry.name),
        }
    }

    println!();
    if report.failed == 0 {
        println!("✓ {} object(s) verified", report.processed);
        Ok(())
    } else {
        println!("✗ {} of {} object(s) failed", report.failed, report.processed);
        Err("verification failed".into())
    }
}
