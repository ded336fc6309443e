//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store session is not open.
    #[error("store is closed")]
    Closed,

    /// Another process holds the store lock.
    #[error("store is locked by another process")]
    Locked,

    /// No object is stored under the given name.
    #[error("object not found: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A stored object is larger than the caller's read limit.
    #[error("object needs {needed} bytes, caller allows {provided}")]
    BufferTooSmall {
        /// Size of the stored object.
        needed: usize,
        /// The caller-supplied maximum.
        provided: usize,
    },

    /// A numeric slot index is outside the medium's slot range.
    #[error("slot {slot} out of range (store has {count} slots)")]
    SlotOutOfRange {
        /// The requested slot.
        slot: u32,
        /// Number of slots in the store.
        count: u32,
    },

    /// A slot write did not supply exactly one slot worth of data.
    #[error("slot write of {len} bytes, slots are {slot_size} bytes")]
    InvalidSlotWrite {
        /// Length of the supplied buffer.
        len: usize,
        /// The fixed slot size.
        slot_size: usize,
    },

    /// An object name is not usable as a store key.
    #[error("invalid object name: {name:?}")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// The directory index no longer fits in its slot.
    #[error("directory index needs {needed} bytes, slot holds {capacity}")]
    IndexOverflow {
        /// Rendered index size.
        needed: usize,
        /// The index slot capacity.
        capacity: usize,
    },
}
