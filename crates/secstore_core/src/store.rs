//! The provisioning session.

use crate::directory::{parse_index, IndexEntry};
use crate::enclave::SecureEnclave;
use crate::error::{CoreError, CoreResult};
use crate::info::SecureInfo;
use crate::registry::WriteProtectRegistry;
use secstore_codec::{SecureObject, ENVELOPE_SIZE};
use secstore_storage::{SlotStore, INDEX_SLOT};
use tracing::{debug, warn};

/// What to zero-fill during an erase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseTarget {
    /// One numeric slot.
    Slot(u32),
    /// Every slot on the medium.
    All,
}

/// How much a directory scan should retain per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Keep each entry's validated contents.
    Dump,
    /// Keep only pass/fail.
    Verify,
}

/// Outcome of one directory entry during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The entry read back and validated.
    Valid {
        /// The validated contents, retained in [`ScanMode::Dump`].
        payload: Option<Vec<u8>>,
    },
    /// The entry is the unused-position placeholder and was not read.
    Skipped,
    /// The entry failed to read or validate.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// One scanned directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// The object name from the index.
    pub name: String,
    /// The stored length recorded in the index.
    pub indexed_len: usize,
    /// Whether the raw (non-envelope) read path was used.
    pub raw: bool,
    /// What happened to the entry.
    pub outcome: EntryOutcome,
}

/// Result of walking the directory index.
///
/// A scan has partial-failure semantics: one corrupt or missing object
/// is recorded and the walk continues, so `failed` can be nonzero while
/// other entries validated fine.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Per-entry outcomes in index order.
    pub entries: Vec<ScanEntry>,
    /// Entries that were actually read (placeholders excluded).
    pub processed: usize,
    /// Entries whose read or validation failed.
    pub failed: usize,
}

/// A secure-object store session.
///
/// Owns the backend, the session's write-protect registry, and the
/// optional secure execution environment - the explicit state that
/// replaces any process-global scratch. Strictly single-writer: all
/// mutation goes through `&mut self`.
///
/// # Example
///
/// ```
/// use secstore_core::SecureStore;
/// use secstore_storage::MemStore;
///
/// let mut store = SecureStore::open(MemStore::new()).unwrap();
/// store.put("hdcpkey", b"key material", false, true).unwrap();
/// let info = store.get("hdcpkey").unwrap();
/// assert_eq!(info.key_data(), b"key material");
/// store.close().unwrap();
/// ```
pub struct SecureStore<B: SlotStore> {
    backend: B,
    registry: WriteProtectRegistry,
    enclave: Option<Box<dyn SecureEnclave>>,
}

impl<B: SlotStore> SecureStore<B> {
    /// Opens a session on `backend`.
    ///
    /// # Errors
    ///
    /// A failed backend open is fatal; no session is created.
    pub fn open(mut backend: B) -> CoreResult<Self> {
        backend.open()?;
        Ok(Self {
            backend,
            registry: WriteProtectRegistry::new(),
            enclave: None,
        })
    }

    /// Attaches a secure execution environment to the session.
    #[must_use]
    pub fn with_enclave(mut self, enclave: Box<dyn SecureEnclave>) -> Self {
        self.enclave = Some(enclave);
        self
    }

    /// Closes the session. The registry is discarded, never persisted.
    ///
    /// # Errors
    ///
    /// A failed backend close is reported; the session is consumed
    /// either way.
    pub fn close(self) -> CoreResult<()> {
        self.into_backend().map(|_| ())
    }

    /// Closes the session and hands the backend back to the caller.
    ///
    /// Useful when the same medium will be opened again later in the
    /// process; the next session starts with a fresh registry either
    /// way.
    ///
    /// # Errors
    ///
    /// A failed backend close is reported; the session is consumed
    /// either way.
    pub fn into_backend(mut self) -> CoreResult<B> {
        self.backend.close()?;
        Ok(self.backend)
    }

    /// The session's write-protect registry.
    #[must_use]
    pub fn registry(&self) -> &WriteProtectRegistry {
        &self.registry
    }

    /// Marks `name` write-protected for the rest of the session.
    ///
    /// Returns whether the name was newly added.
    pub fn mark_protected(&mut self, name: &str) -> bool {
        let added = self.registry.mark(name);
        if added {
            debug!(name, "marked write-protected");
        }
        added
    }

    /// Builds and persists a secure object.
    ///
    /// The payload is wrapped by the enclave when `encrypt` is set and
    /// one is attached, recorded into a secure-info record, sealed into
    /// an integrity envelope (with the protection sentinel taken from
    /// the session registry), and written under `name`. Requesting
    /// `write_protect` also marks the name in the registry first, so
    /// the record flag and the envelope sentinel cannot disagree.
    ///
    /// # Errors
    ///
    /// Payload over the provisioning limit, enclave failure, a record
    /// too large for the envelope, or a backend write failure.
    pub fn put(
        &mut self,
        name: &str,
        payload: &[u8],
        encrypt: bool,
        write_protect: bool,
    ) -> CoreResult<()> {
        if write_protect {
            self.registry.mark(name);
        }
        let info = SecureInfo::build(
            name,
            payload,
            encrypt,
            write_protect,
            self.enclave.as_deref(),
        )?;
        let record = info.encode_bytes();
        let object = SecureObject::seal(name, &record, self.registry.is_protected(name))?;
        self.backend.write_named(name, &object.encode())?;
        debug!(name, record_len = record.len(), "secure object stored");
        Ok(())
    }

    /// Reads back the secure-info record stored under `name`.
    ///
    /// # Errors
    ///
    /// Backend read failure, envelope validation failure, or a payload
    /// that is not a secure-info record.
    pub fn get(&self, name: &str) -> CoreResult<SecureInfo> {
        let object = self.read_object(name)?;
        SecureInfo::parse(object.payload())
    }

    /// Copies the serialized record stored under `name` into `buf`.
    ///
    /// At most `buf.len()` bytes are copied; a record longer than the
    /// buffer is truncated, which is not an error. Returns the number
    /// of bytes copied.
    ///
    /// # Errors
    ///
    /// Backend read failure or envelope validation failure.
    pub fn get_into(&self, name: &str, buf: &mut [u8]) -> CoreResult<usize> {
        let object = self.read_object(name)?;
        let record = object.payload();
        let copied = record.len().min(buf.len());
        buf[..copied].copy_from_slice(&record[..copied]);
        Ok(copied)
    }

    /// Reads and validates the envelope stored under `name`.
    ///
    /// # Errors
    ///
    /// Backend read failure or envelope validation failure.
    pub fn read_object(&self, name: &str) -> CoreResult<SecureObject> {
        let bytes = self.backend.read_named(name, ENVELOPE_SIZE)?;
        let object = SecureObject::decode(&bytes)?;
        if object.chip_encrypted() {
            debug!(name, "object was re-encrypted by the secure world");
        }
        Ok(object)
    }

    /// Backend-native listing of stored object names.
    ///
    /// # Errors
    ///
    /// Backend failure.
    pub fn names(&self) -> CoreResult<Vec<String>> {
        Ok(self.backend.names()?)
    }

    /// Walks the directory index, reading and validating every entry.
    ///
    /// Placeholder entries are skipped without a read. Burn-flag
    /// entries are read raw; everything else goes through envelope
    /// validation. One entry's failure is recorded and the walk
    /// continues.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexReadFailure`] if the index slot itself cannot
    /// be read, or [`CoreError::IndexMalformed`] if the blob violates
    /// the token grammar. Individual entry failures do NOT error - they
    /// land in the report.
    pub fn scan(&self, mode: ScanMode) -> CoreResult<ScanReport> {
        let blob = self
            .backend
            .read_slot(INDEX_SLOT)
            .map_err(|e| CoreError::IndexReadFailure {
                message: e.to_string(),
            })?;
        let entries = parse_index(&blob)?;

        let mut report = ScanReport::default();
        for entry in entries {
            let outcome = self.scan_entry(&entry, mode);
            match &outcome {
                EntryOutcome::Skipped => {}
                EntryOutcome::Valid { .. } => report.processed += 1,
                EntryOutcome::Failed { reason } => {
                    report.processed += 1;
                    report.failed += 1;
                    warn!(name = %entry.name, %reason, "directory entry failed");
                }
            }
            report.entries.push(ScanEntry {
                raw: entry.is_raw(),
                name: entry.name,
                indexed_len: entry.len,
                outcome,
            });
        }
        Ok(report)
    }

    fn scan_entry(&self, entry: &IndexEntry, mode: ScanMode) -> EntryOutcome {
        if entry.is_dummy() {
            return EntryOutcome::Skipped;
        }

        let contents = if entry.is_raw() {
            self.backend
                .read_named(&entry.name, self.backend.slot_size())
                .map_err(CoreError::from)
        } else {
            self.read_object(&entry.name).map(SecureObject::into_payload)
        };

        match contents {
            Ok(payload) => EntryOutcome::Valid {
                payload: match mode {
                    ScanMode::Dump => Some(payload),
                    ScanMode::Verify => None,
                },
            },
            Err(e) => EntryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Zero-fills one slot or the whole medium.
    ///
    /// Destructive maintenance is best-effort: individual slot write
    /// failures are logged and swallowed, and the erase itself always
    /// succeeds once the session is open.
    pub fn erase(&mut self, target: EraseTarget) {
        let zeros = vec![0u8; self.backend.slot_size()];
        let slots: Vec<u32> = match target {
            EraseTarget::Slot(slot) => vec![slot],
            EraseTarget::All => (0..self.backend.slot_count()).collect(),
        };
        for slot in slots {
            match self.backend.write_slot(slot, &zeros) {
                Ok(()) => debug!(slot, "slot erased"),
                Err(e) => warn!(slot, error = %e, "slot erase failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{BURNED_FLAG_PREFIX, DUMMY_KEY_NAME};
    use secstore_storage::{MemStore, StoreError, StoreResult, SLOT_COUNT, SLOT_SIZE};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn open_mem() -> SecureStore<MemStore> {
        SecureStore::open(MemStore::new()).unwrap()
    }

    #[test]
    fn put_get_roundtrip() {
        let mut store = open_mem();
        store.put("widevine", b"keybox bytes", false, false).unwrap();

        let info = store.get("widevine").unwrap();
        assert_eq!(info.name(), "widevine");
        assert_eq!(info.key_data(), b"keybox bytes");
        assert!(!info.encrypted());
        store.close().unwrap();
    }

    #[test]
    fn write_protect_stamps_envelope_and_registry() {
        let mut store = open_mem();
        store.put("hdcpkey", b"k", false, true).unwrap();

        assert!(store.registry().is_protected("hdcpkey"));
        let object = store.read_object("hdcpkey").unwrap();
        assert!(object.write_protected());
        let info = store.get("hdcpkey").unwrap();
        assert!(info.write_protected());
    }

    #[test]
    fn registry_mark_applies_to_later_puts() {
        let mut store = open_mem();
        assert!(store.mark_protected("widevine"));
        store.put("widevine", b"k", false, false).unwrap();

        let object = store.read_object("widevine").unwrap();
        assert!(object.write_protected(), "sentinel comes from the registry");
        let info = store.get("widevine").unwrap();
        assert!(!info.write_protected(), "the record keeps the call's flag");
    }

    #[test]
    fn get_into_truncates_without_error() {
        let mut store = open_mem();
        store.put("k", b"0123456789", false, false).unwrap();

        let full_len = store.get("k").unwrap().encode_bytes().len();

        let mut small = [0u8; 8];
        assert_eq!(store.get_into("k", &mut small).unwrap(), 8);
        assert_eq!(&small, b"k\0\0\0\0\0\0\0");

        let mut big = vec![0u8; 8192];
        assert_eq!(store.get_into("k", &mut big).unwrap(), full_len);
    }

    #[test]
    fn oversize_record_fails_before_any_write() {
        let mut store = open_mem();
        // Fits the provisioning limit but not the envelope data block.
        let payload = vec![0u8; 4000];
        let err = store.put("big", &payload, false, false).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Codec(secstore_codec::CodecError::PayloadTooLarge { .. })
        ));
        assert!(matches!(
            store.get("big").unwrap_err(),
            CoreError::Storage(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn scan_dump_returns_payloads() {
        let mut store = open_mem();
        store.put("alpha", b"aaa", false, false).unwrap();
        store.put("beta", b"bbb", false, false).unwrap();

        let report = store.scan(ScanMode::Dump).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 0);
        let payloads: Vec<_> = report
            .entries
            .iter()
            .map(|e| match &e.outcome {
                EntryOutcome::Valid { payload: Some(p) } => p.clone(),
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        // Dump yields the stored records, which parse back to the keys.
        assert_eq!(SecureInfo::parse(&payloads[0]).unwrap().key_data(), b"aaa");
        assert_eq!(SecureInfo::parse(&payloads[1]).unwrap().key_data(), b"bbb");
    }

    #[test]
    fn scan_verify_drops_payloads() {
        let mut store = open_mem();
        store.put("alpha", b"aaa", false, false).unwrap();
        let report = store.scan(ScanMode::Verify).unwrap();
        assert!(matches!(
            report.entries[0].outcome,
            EntryOutcome::Valid { payload: None }
        ));
    }

    #[test]
    fn scan_skips_dummy_and_continues_past_failures() {
        let mut store = open_mem();
        // A directory entry whose stored bytes are not a valid envelope.
        store.backend.write_named("alpha", b"garbage").unwrap();
        // The unused-position placeholder: present in the index, length 0.
        store.backend.write_named(DUMMY_KEY_NAME, b"").unwrap();

        let report = store.scan(ScanMode::Verify).unwrap();
        assert_eq!(report.entries.len(), 2);
        assert!(matches!(
            report.entries[0].outcome,
            EntryOutcome::Failed { .. }
        ));
        assert!(matches!(report.entries[1].outcome, EntryOutcome::Skipped));
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn scan_reads_burn_flags_raw() {
        let mut store = open_mem();
        let name = format!("{BURNED_FLAG_PREFIX}_widevine");
        store.backend.write_named(&name, b"\x01").unwrap();

        let report = store.scan(ScanMode::Dump).unwrap();
        assert_eq!(report.failed, 0);
        assert!(report.entries[0].raw);
        assert!(matches!(
            &report.entries[0].outcome,
            EntryOutcome::Valid { payload: Some(p) } if p == b"\x01"
        ));
    }

    /// Backend whose index slot cannot be read.
    struct BrokenIndexStore(MemStore);

    impl SlotStore for BrokenIndexStore {
        fn open(&mut self) -> StoreResult<()> {
            self.0.open()
        }
        fn close(&mut self) -> StoreResult<()> {
            self.0.close()
        }
        fn read_named(&self, name: &str, max_len: usize) -> StoreResult<Vec<u8>> {
            self.0.read_named(name, max_len)
        }
        fn write_named(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
            self.0.write_named(name, data)
        }
        fn read_slot(&self, _slot: u32) -> StoreResult<Vec<u8>> {
            Err(StoreError::Io(std::io::Error::other("bad medium")))
        }
        fn write_slot(&mut self, slot: u32, data: &[u8]) -> StoreResult<()> {
            self.0.write_slot(slot, data)
        }
        fn names(&self) -> StoreResult<Vec<String>> {
            self.0.names()
        }
    }

    #[test]
    fn unreadable_index_aborts_scan() {
        let store = SecureStore::open(BrokenIndexStore(MemStore::new())).unwrap();
        let err = store.scan(ScanMode::Verify).unwrap_err();
        assert!(matches!(err, CoreError::IndexReadFailure { .. }));
    }

    /// Backend that counts slot writes.
    struct CountingStore {
        inner: MemStore,
        slot_writes: AtomicU32,
    }

    impl SlotStore for CountingStore {
        fn open(&mut self) -> StoreResult<()> {
            self.inner.open()
        }
        fn close(&mut self) -> StoreResult<()> {
            self.inner.close()
        }
        fn read_named(&self, name: &str, max_len: usize) -> StoreResult<Vec<u8>> {
            self.inner.read_named(name, max_len)
        }
        fn write_named(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
            self.inner.write_named(name, data)
        }
        fn read_slot(&self, slot: u32) -> StoreResult<Vec<u8>> {
            self.inner.read_slot(slot)
        }
        fn write_slot(&mut self, slot: u32, data: &[u8]) -> StoreResult<()> {
            self.slot_writes.fetch_add(1, Ordering::Relaxed);
            self.inner.write_slot(slot, data)
        }
        fn names(&self) -> StoreResult<Vec<String>> {
            self.inner.names()
        }
    }

    #[test]
    fn erase_all_touches_every_slot_once() {
        let mut store = SecureStore::open(CountingStore {
            inner: MemStore::new(),
            slot_writes: AtomicU32::new(0),
        })
        .unwrap();

        store.erase(EraseTarget::All);
        assert_eq!(
            store.backend.slot_writes.load(Ordering::Relaxed),
            SLOT_COUNT
        );
        for slot in 0..SLOT_COUNT {
            let data = store.backend.read_slot(slot).unwrap();
            assert!(data.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn erase_single_slot() {
        let mut store = open_mem();
        store
            .backend
            .write_slot(5, &vec![0xFFu8; SLOT_SIZE])
            .unwrap();
        store.erase(EraseTarget::Slot(5));
        assert!(store.backend.read_slot(5).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn erase_swallows_slot_failures() {
        let mut store = open_mem();
        // Out of range: logged, not propagated.
        store.erase(EraseTarget::Slot(SLOT_COUNT + 10));
    }
}
