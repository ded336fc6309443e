//! In-memory slot store for testing.

use crate::backend::{SlotStore, INDEX_SLOT, SLOT_COUNT, SLOT_SIZE};
use crate::error::{StoreError, StoreResult};
use crate::index;
use parking_lot::RwLock;

/// An in-memory slot store.
///
/// All state lives on the heap; nothing survives the process. Suitable
/// for unit tests, integration tests, and ephemeral provisioning runs.
///
/// # Thread Safety
///
/// Interior state is behind `RwLock`s, so a `MemStore` can be shared
/// across threads.
#[derive(Debug)]
pub struct MemStore {
    /// Named objects in insertion order.
    objects: RwLock<Vec<(String, Vec<u8>)>>,
    slots: RwLock<Vec<Vec<u8>>>,
    open: RwLock<bool>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            slots: RwLock::new(vec![vec![0u8; SLOT_SIZE]; SLOT_COUNT as usize]),
            open: RwLock::new(false),
        }
    }
}

impl MemStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the blob stored under `name`, if any.
    ///
    /// Bypasses the session check; useful for test assertions.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    fn refresh_index(&self) -> StoreResult<()> {
        let entries: Vec<(String, usize)> = self
            .objects
            .read()
            .iter()
            .map(|(name, data)| (name.clone(), data.len()))
            .collect();
        let blob = index::render(&entries, SLOT_SIZE)?;
        self.slots.write()[INDEX_SLOT as usize] = blob;
        Ok(())
    }
}

impl SlotStore for MemStore {
    fn open(&mut self) -> StoreResult<()> {
        *self.open.write() = true;
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        *self.open.write() = false;
        Ok(())
    }

    fn read_named(&self, name: &str, max_len: usize) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let objects = self.objects.read();
        let (_, data) = objects
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?;
        if data.len() > max_len {
            return Err(StoreError::BufferTooSmall {
                needed: data.len(),
                provided: max_len,
            });
        }
        Ok(data.clone())
    }

    fn write_named(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        if name.is_empty() {
            return Err(StoreError::InvalidName {
                name: name.to_string(),
            });
        }
        {
            let mut objects = self.objects.write();
            match objects.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = data.to_vec(),
                None => objects.push((name.to_string(), data.to_vec())),
            }
        }
        self.refresh_index()
    }

    fn read_slot(&self, slot: u32) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let slots = self.slots.read();
        slots
            .get(slot as usize)
            .cloned()
            .ok_or(StoreError::SlotOutOfRange {
                slot,
                count: SLOT_COUNT,
            })
    }

    fn write_slot(&mut self, slot: u32, data: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        if data.len() != SLOT_SIZE {
            return Err(StoreError::InvalidSlotWrite {
                len: data.len(),
                slot_size: SLOT_SIZE,
            });
        }
        let mut slots = self.slots.write();
        let target = slots
            .get_mut(slot as usize)
            .ok_or(StoreError::SlotOutOfRange {
                slot,
                count: SLOT_COUNT,
            })?;
        target.copy_from_slice(data);
        Ok(())
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self
            .objects
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }
}
