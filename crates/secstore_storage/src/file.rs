//! Directory-backed slot store for persistent use.

use crate::backend::{SlotStore, INDEX_SLOT, SLOT_COUNT, SLOT_SIZE};
use crate::error::{StoreError, StoreResult};
use crate::index;
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const SLOTS_FILE: &str = "slots.bin";
const OBJECTS_DIR: &str = "objects";

/// A persistent slot store rooted at a directory.
///
/// Layout:
///
/// - `slots.bin` - the raw numeric slots, 32 x 4096 bytes
/// - `objects/<name>` - one file per named blob
/// - `LOCK` - exclusive advisory lock held while the session is open
///
/// The object list is rebuilt by scanning `objects/` at open time, and
/// the directory index in slot 0 is regenerated from it, so the index
/// always reflects what is actually on disk.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    slots: RwLock<Option<File>>,
    names: RwLock<Vec<String>>,
    lock: Option<File>,
}

impl FileStore {
    /// Creates a store rooted at `root`. The session is not yet open.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            slots: RwLock::new(None),
            names: RwLock::new(Vec::new()),
            lock: None,
        }
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    fn object_path(&self, name: &str) -> StoreResult<PathBuf> {
        // Names are store keys, not paths; anything that could escape
        // the objects directory is rejected.
        let valid = !name.is_empty()
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0')
            && name != "."
            && name != "..";
        if !valid {
            return Err(StoreError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.objects_dir().join(name))
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.slots.read().is_some() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    fn refresh_index(&self) -> StoreResult<()> {
        let entries: Vec<(String, usize)> = {
            let names = self.names.read();
            let mut out = Vec::with_capacity(names.len());
            for name in names.iter() {
                let len = fs::metadata(self.objects_dir().join(name))?.len() as usize;
                out.push((name.clone(), len));
            }
            out
        };
        let blob = index::render(&entries, SLOT_SIZE)?;
        self.write_slot_bytes(INDEX_SLOT, &blob)
    }

    fn write_slot_bytes(&self, slot: u32, data: &[u8]) -> StoreResult<()> {
        let mut guard = self.slots.write();
        let file = guard.as_mut().ok_or(StoreError::Closed)?;
        file.seek(SeekFrom::Start(u64::from(slot) * SLOT_SIZE as u64))?;
        file.write_all(data)?;
        Ok(())
    }
}

impl SlotStore for FileStore {
    fn open(&mut self) -> StoreResult<()> {
        fs::create_dir_all(self.objects_dir())?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        let slots_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(SLOTS_FILE))?;
        let total = u64::from(SLOT_COUNT) * SLOT_SIZE as u64;
        if slots_file.metadata()?.len() < total {
            slots_file.set_len(total)?;
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(self.objects_dir())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        *self.slots.write() = Some(slots_file);
        *self.names.write() = names;
        self.lock = Some(lock_file);
        self.refresh_index()
    }

    fn close(&mut self) -> StoreResult<()> {
        let file = self.slots.write().take();
        if let Some(file) = file {
            file.sync_all()?;
        }
        self.names.write().clear();
        // Dropping the handle releases the advisory lock.
        self.lock = None;
        Ok(())
    }

    fn read_named(&self, name: &str, max_len: usize) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let path = self.object_path(name)?;
        let data = fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound {
                    name: name.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        if data.len() > max_len {
            return Err(StoreError::BufferTooSmall {
                needed: data.len(),
                provided: max_len,
            });
        }
        Ok(data)
    }

    fn write_named(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        let path = self.object_path(name)?;
        fs::write(path, data)?;
        {
            let mut names = self.names.write();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        self.refresh_index()
    }

    fn read_slot(&self, slot: u32) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        if slot >= SLOT_COUNT {
            return Err(StoreError::SlotOutOfRange {
                slot,
                count: SLOT_COUNT,
            });
        }
        let mut guard = self.slots.write();
        let file = guard.as_mut().ok_or(StoreError::Closed)?;
        file.seek(SeekFrom::Start(u64::from(slot) * SLOT_SIZE as u64))?;
        let mut buffer = vec![0u8; SLOT_SIZE];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write_slot(&mut self, slot: u32, data: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        if slot >= SLOT_COUNT {
            return Err(StoreError::SlotOutOfRange {
                slot,
                count: SLOT_COUNT,
            });
        }
        if data.len() != SLOT_SIZE {
            return Err(StoreError::InvalidSlotWrite {
                len: data.len(),
                slot_size: SLOT_SIZE,
            });
        }
        self.write_slot_bytes(slot, data)
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.names.read().clone())
    }
}
