//! # secstore core
//!
//! Secure-object provisioning core.
//!
//! This crate ties the envelope codec and the slot-store backend into a
//! provisioning session:
//!
//! - [`SecureStore`] - the session owning the backend, the
//!   write-protect registry, and the optional secure execution
//!   environment
//! - [`SecureInfo`] - the named, possibly-encrypted key record that
//!   provisioning persists
//! - [`WriteProtectRegistry`] - the advisory in-session protection list
//! - [`SecureEnclave`] / [`KeyClass`] - the device-key encryption seam
//! - directory-index parsing and the scan/erase maintenance operations
//!
//! ## Example
//!
//! ```
//! use secstore_core::{ScanMode, SecureStore};
//! use secstore_storage::MemStore;
//!
//! let mut store = SecureStore::open(MemStore::new()).unwrap();
//! store.put("widevine", b"keybox", false, true).unwrap();
//!
//! let report = store.scan(ScanMode::Verify).unwrap();
//! assert_eq!(report.processed, 1);
//! assert_eq!(report.failed, 0);
//! store.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod directory;
mod enclave;
mod error;
mod info;
mod registry;
mod store;

pub use directory::{parse_index, IndexEntry, BURNED_FLAG_PREFIX, DUMMY_KEY_NAME};
pub use enclave::{KeyClass, SecureEnclave, HDMI_ROOT_KEY_NAME};
pub use error::{CoreError, CoreResult};
pub use info::{SecureInfo, INFO_HEAD_LEN, MAX_KEY_LEN};
pub use registry::WriteProtectRegistry;
pub use store::{EntryOutcome, EraseTarget, ScanEntry, ScanMode, ScanReport, SecureStore};

#[cfg(feature = "soft-enclave")]
pub use enclave::{SoftEnclave, DEVICE_SECRET_LEN};
