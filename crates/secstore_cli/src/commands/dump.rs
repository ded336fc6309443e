//! Dump command implementation.

use super::open_store;
use secstore_core::{EntryOutcome, ScanMode, ScanReport};
use serde_json::json;
use std::path::Path;

/// Runs the dump command.
///
/// With `raw` set, prints the backend-native name listing instead of
/// walking the directory index.
pub fn run(path: &Path, raw: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;

    if raw {
        let names = store.names()?;
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&names)?),
            _ => {
                println!("{} stored object(s):", names.len());
                for name in names {
                    println!("  {name}");
                }
            }
        }
        return finish(store);
    }

    let report = store.scan(ScanMode::Dump)?;
    match format {
        "json" => print_json(&report)?,
        _ => print_text(&report),
    }
    finish(store)
}

fn finish(
    store: secstore_core::SecureStore<secstore_storage::FileStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    store.close()?;
    Ok(())
}

fn print_text(report: &ScanReport) {
    for entry in &report.entries {
        match &entry.outcome {
            EntryOutcome::Valid { payload } => {
                let kind = if entry.raw { "raw" } else { "object" };
                println!("{} ({kind}, {} bytes in index):", entry.name, entry.indexed_len);
                if let Some(payload) = payload {
                    hex_dump(payload);
                }
            }
            EntryOutcome::Skipped => println!("{} (placeholder, skipped)", entry.name),
            EntryOutcome::Failed { reason } => println!("{}: FAILED - {reason}", entry.name),
        }
    }
    println!();
    println!(
        "{} entr{} processed, {} failed",
        report.processed,
        if report.processed == 1 { "y" } else { "ies" },
        report.failed
    );
}

fn print_json(report: &ScanReport) -> Result<(), Box<dyn std::error::Error>> {
    let entries: Vec<_> = report
        .entries
        .iter()
        .map(|entry| {
            let (status, detail) = match &entry.outcome {
                EntryOutcome::Valid { payload } => (
                    "valid",
                    payload.as_ref().map(|p| {
                        p.iter().map(|b| format!("{b:02x}")).collect::<String>()
                    }),
                ),
                EntryOutcome::Skipped => ("skipped", None),
                EntryOutcome::Failed { reason } => ("failed", Some(reason.clone())),
            };
            json!({
                "name": entry.name,
                "indexed_len": entry.indexed_len,
                "raw": entry.raw,
                "status": status,
                "detail": detail,
            })
        })
        .collect();

    let doc = json!({
        "entries": entries,
        "processed": report.processed,
        "failed": report.failed,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn hex_dump(data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("  {:08x}  {:<47}  |{ascii}|", i * 16, hex.join(" "));
    }
}
