//! In-memory shard store.
//!
//! Shared-state implementation of [`FileSystem`] used as the test double
//! for every engine component and as an embedded store. Supports
//! one-shot fault injection so tests can exercise listing failures,
//! writer-open failures, and per-file write failures deterministically.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::storage::{DataPacket, FileSystem, ShardReader, ShardWriter};

/// Fault injection switches for [`MemoryFileSystem`].
///
/// The `force_*` flags are one-shot: the next matching call fails and
/// the flag clears. `fail_writes` is persistent: every append to a
/// listed file fails until the name is removed.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// If true, the next `list` call fails (one-shot).
    pub force_list_fail: bool,
    /// If true, the next `create` call fails (one-shot).
    pub force_create_fail: bool,
    /// If true, the next `writer` open fails (one-shot).
    pub force_writer_fail: bool,
    /// If true, the next `reader` open fails (one-shot).
    pub force_reader_fail: bool,
    /// Files whose appends always fail.
    pub fail_writes: HashSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<Bytes>>,
    faults: FaultConfig,
}

/// In-memory [`FileSystem`] with fault injection.
///
/// Clones share the same underlying state (via `Arc`), so a test can
/// hold one handle while the engine under test holds another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryFileSystem {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the one-shot list failure flag.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn force_list_fail(&self) {
        self.lock().faults.force_list_fail = true;
    }

    /// Sets the one-shot create failure flag.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn force_create_fail(&self) {
        self.lock().faults.force_create_fail = true;
    }

    /// Sets the one-shot writer-open failure flag.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn force_writer_fail(&self) {
        self.lock().faults.force_writer_fail = true;
    }

    /// Sets the one-shot reader-open failure flag.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn force_reader_fail(&self) {
        self.lock().faults.force_reader_fail = true;
    }

    /// Makes every append to `name` fail until cleared.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn fail_writes_to(&self, name: &str) {
        self.lock().faults.fail_writes.insert(name.to_string());
    }

    /// Clears the per-file write failure for `name`.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn heal_writes_to(&self, name: &str) {
        self.lock().faults.fail_writes.remove(name);
    }

    /// Returns the records currently stored in `name`, for inspection.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn records(&self, name: &str) -> Vec<Bytes> {
        self.lock().files.get(name).cloned().unwrap_or_default()
    }

    /// Returns all file names, synchronously, for inspection.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Appends a record directly, bypassing the writer path.
    ///
    /// Creates the file if needed. Useful for seeding fixtures.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn append_raw(&self, name: &str, payload: Bytes) {
        self.lock()
            .files
            .entry(name.to_string())
            .or_default()
            .push(payload);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn create(&self, name: &str) -> StoreResult<()> {
        assert!(!name.is_empty(), "file name must not be empty");

        let mut inner = self.lock();
        if inner.faults.force_create_fail {
            inner.faults.force_create_fail = false;
            return Err(StoreError::io("create", "simulated create failure"));
        }

        inner.files.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut inner = self.lock();
        if inner.faults.force_list_fail {
            inner.faults.force_list_fail = false;
            return Err(StoreError::io("list", "simulated list failure"));
        }

        Ok(inner.files.keys().cloned().collect())
    }

    async fn writer(&self, name: &str) -> StoreResult<Box<dyn ShardWriter>> {
        let mut inner = self.lock();
        if inner.faults.force_writer_fail {
            inner.faults.force_writer_fail = false;
            return Err(StoreError::io("writer", "simulated writer-open failure"));
        }
        if !inner.files.contains_key(name) {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        drop(inner);

        Ok(Box::new(MemoryWriter {
            inner: Arc::clone(&self.inner),
            file: name.to_string(),
        }))
    }

    async fn reader(
        &self,
        name: &str,
        start_index: u64,
    ) -> StoreResult<Box<dyn ShardReader>> {
        let mut inner = self.lock();
        if inner.faults.force_reader_fail {
            inner.faults.force_reader_fail = false;
            return Err(StoreError::io("reader", "simulated reader-open failure"));
        }
        if !inner.files.contains_key(name) {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        drop(inner);

        Ok(Box::new(MemoryReader {
            inner: Arc::clone(&self.inner),
            file: name.to_string(),
            next_index: start_index,
        }))
    }
}

struct MemoryWriter {
    inner: Arc<Mutex<Inner>>,
    file: String,
}

#[async_trait]
impl ShardWriter for MemoryWriter {
    async fn write(&mut self, payload: Bytes) -> StoreResult<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if inner.faults.fail_writes.contains(&self.file) {
            return Err(StoreError::io("write", "simulated write failure"));
        }

        let records = inner
            .files
            .get_mut(&self.file)
            .ok_or_else(|| StoreError::NotFound {
                name: self.file.clone(),
            })?;
        records.push(payload);
        Ok(())
    }

    async fn close(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

struct MemoryReader {
    inner: Arc<Mutex<Inner>>,
    file: String,
    next_index: u64,
}

#[async_trait]
impl ShardReader for MemoryReader {
    async fn read(&mut self) -> StoreResult<DataPacket> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let records = inner
            .files
            .get(&self.file)
            .ok_or_else(|| StoreError::NotFound {
                name: self.file.clone(),
            })?;

        // Safety: record counts are bounded far below usize::MAX.
        #[allow(clippy::cast_possible_truncation)]
        let idx = self.next_index as usize;
        let Some(payload) = records.get(idx) else {
            // Live tail: the reader stays usable and sees later appends.
            return Err(StoreError::EndOfStream);
        };

        let packet = DataPacket {
            payload: payload.clone(),
            file: self.file.clone(),
            index: self.next_index,
        };
        self.next_index += 1;
        Ok(packet)
    }

    async fn close(&mut self) -> StoreResult<()> {
        Ok(())
    }
}
