//! Slot-store backend trait definition.

use crate::error::StoreResult;

/// Number of raw numeric slots on the medium.
pub const SLOT_COUNT: u32 = 32;

/// Size of one raw slot in bytes.
pub const SLOT_SIZE: usize = 4096;

/// The numeric slot holding the directory index blob.
pub const INDEX_SLOT: u32 = 0;

/// A fixed-slot secure storage medium.
///
/// Slot stores are **opaque byte stores**. They persist named blobs and
/// expose raw access to a fixed number of numeric slots. The object
/// envelope format, integrity checking, and directory parsing all live
/// above this trait - backends never interpret the bytes they hold.
///
/// # Sessions
///
/// Every store must be bracketed by [`open`](SlotStore::open) and
/// [`close`](SlotStore::close). All other operations fail with
/// [`StoreError::Closed`](crate::StoreError::Closed) outside a session.
/// A failed bracket call is fatal to the caller's whole operation
/// sequence; there is no partial-session mode.
///
/// # Directory index
///
/// Named writes keep slot [`INDEX_SLOT`] up to date with a directory blob
/// of `name:len ` tokens terminated by a NUL byte. The index is owned by
/// the backend; readers above this trait parse it but never write it.
///
/// # Invariants
///
/// - `read_named` returns exactly the bytes previously written under that
///   name
/// - `write_slot` accepts exactly [`SLOT_SIZE`] bytes; slots never vary
///   in size
/// - Implementations must be `Send + Sync`
pub trait SlotStore: Send + Sync {
    /// Opens a storage session.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be brought up, or if another
    /// process holds it exclusively.
    fn open(&mut self) -> StoreResult<()>;

    /// Closes the storage session, flushing any pending state.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails. The session is considered
    /// closed regardless.
    fn close(&mut self) -> StoreResult<()>;

    /// Reads the blob stored under `name`.
    ///
    /// `max_len` is the caller's read limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed, the name is unknown, or
    /// the stored blob exceeds `max_len`.
    fn read_named(&self, name: &str, max_len: usize) -> StoreResult<Vec<u8>>;

    /// Stores `data` under `name`, replacing any previous blob, and
    /// refreshes the directory index in slot [`INDEX_SLOT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed, the name is not a valid
    /// store key, or the write fails.
    fn write_named(&mut self, name: &str, data: &[u8]) -> StoreResult<()>;

    /// Reads one whole raw slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or `slot` is out of
    /// range.
    fn read_slot(&self, slot: u32) -> StoreResult<Vec<u8>>;

    /// Overwrites one whole raw slot.
    ///
    /// `data` must be exactly [`SLOT_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed, `slot` is out of range,
    /// or `data` is not slot-sized.
    fn write_slot(&mut self, slot: u32, data: &[u8]) -> StoreResult<()>;

    /// Lists the names of all stored objects, in storage order.
    ///
    /// This is the backend-native listing; it does not consult the
    /// directory index blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed.
    fn names(&self) -> StoreResult<Vec<String>>;

    /// The fixed slot size of this medium in bytes.
    fn slot_size(&self) -> usize {
        SLOT_SIZE
    }

    /// The number of raw slots on this medium.
    fn slot_count(&self) -> u32 {
        SLOT_COUNT
    }
}
