//! # secstore storage
//!
//! Slot-store backend trait and implementations for secstore.
//!
//! This crate is the lowest layer of the stack: a fixed-slot persistent
//! medium that stores **opaque byte blobs** by name and exposes raw
//! access to 32 numeric slots of 4096 bytes each. Everything about the
//! object format - envelopes, integrity checking, encryption - lives in
//! the crates above; backends never interpret stored bytes.
//!
//! The one structural duty a backend has is the directory index: slot 0
//! holds a `name:len ` token blob enumerating the stored objects, and
//! backends keep it current on every named write.
//!
//! ## Available backends
//!
//! - [`MemStore`] - in-memory, for tests and ephemeral use
//! - [`FileStore`] - directory-backed persistent store with an exclusive
//!   advisory lock
//!
//! ## Example
//!
//! ```rust
//! use secstore_storage::{MemStore, SlotStore};
//!
//! let mut store = MemStore::new();
//! store.open().unwrap();
//! store.write_named("hdcpkey", b"blob").unwrap();
//! assert_eq!(store.read_named("hdcpkey", 4096).unwrap(), b"blob");
//! store.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod index;
mod memory;

pub use backend::{SlotStore, INDEX_SLOT, SLOT_COUNT, SLOT_SIZE};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemStore;
