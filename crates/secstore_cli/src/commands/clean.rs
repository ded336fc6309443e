//! Clean command implementation.

use super::open_store;
use secstore_core::EraseTarget;
use secstore_storage::SLOT_COUNT;
use std::path::Path;

/// Runs the clean command.
///
/// `target` is a slot number or `"all"`.
pub fn run(path: &Path, target: &str) -> Result<(), Box<dyn std::error::Error>> {
    let target = if target.eq_ignore_ascii_case("all") {
        EraseTarget::All
    } else {
        let slot: u32 = target
            .parse()
            .map_err(|_| format!("slot must be a number or \"all\", got {target:?}"))?;
        if slot >= SLOT_COUNT {
            return Err(format!("slot {slot} out of range (store has {SLOT_COUNT} slots)").into());
        }
        EraseTarget::Slot(slot)
    };

    let mut store = open_store(path)?;
    match target {
        EraseTarget::All => println!("Cleaning whole store at {}", path.display()),
        EraseTarget::Slot(slot) => println!("Cleaning slot {slot} at {}", path.display()),
    }
    store.erase(target);
    store.close()?;
    println!("Done");
    Ok(())
}
