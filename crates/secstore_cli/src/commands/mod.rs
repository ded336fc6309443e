//! CLI command implementations.

pub mod clean;
pub mod dump;
pub mod verify;

use secstore_core::{CoreResult, SecureStore};
use secstore_storage::FileStore;
use std::path::Path;

/// Opens a provisioning session on the store directory.
pub fn open_store(path: &Path) -> CoreResult<SecureStore<FileStore>> {
    SecureStore::open(FileStore::new(path))
}
