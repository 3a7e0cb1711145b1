//! A storage adapter which counts the operations and bytes that pass through it.

use crate::{
    byte_range::ByteRange, Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits,
    StorageError, StoreKey, StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Debug, Default)]
struct Counters {
    bytes_read: AtomicUsize,
    bytes_written: AtomicUsize,
    reads: AtomicUsize,
    byte_range_reads: AtomicUsize,
    writes: AtomicUsize,
    keys_erased: AtomicUsize,
}

impl Counters {
    fn all(&self) -> [&AtomicUsize; 6] {
        [
            &self.bytes_read,
            &self.bytes_written,
            &self.reads,
            &self.byte_range_reads,
            &self.writes,
            &self.keys_erased,
        ]
    }
}

fn add(counter: &AtomicUsize, value: usize) {
    counter.fetch_add(value, Ordering::Relaxed);
}

/// A storage adapter that accumulates the number of reads, writes, and erases of an inner store and the bytes transferred.
///
/// Tests use it to check how much of a store an array operation touches,
/// such as a sharded read fetching only the shard index and one inner chunk rather than the whole shard.
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// # use zarrkit_storage::{store::MemoryStore, ReadableStorageTraits, StoreKey, WritableStorageTraits};
/// # use zarrkit_storage::byte_range::ByteRange;
/// # use zarrkit_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PerformanceMetricsStorageAdapter::new(Arc::new(MemoryStore::new()));
/// let key = StoreKey::new("c/0/0")?;
/// store.set(&key, vec![0; 64].into())?;
/// store.get_byte_range(&key, &ByteRange::suffix(16))?;
/// assert_eq!(store.bytes_read(), 16);
/// assert_eq!(store.byte_range_reads(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PerformanceMetricsStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    counters: Counters,
}

impl<TStorage: ?Sized> PerformanceMetricsStorageAdapter<TStorage> {
    /// Create a new performance metrics storage adapter wrapping `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            counters: Counters::default(),
        }
    }

    /// Set every counter to zero.
    pub fn reset(&self) {
        for counter in self.counters.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// The number of bytes returned by reads.
    pub fn bytes_read(&self) -> usize {
        self.counters.bytes_read.load(Ordering::Relaxed)
    }

    /// The number of bytes passed to writes.
    pub fn bytes_written(&self) -> usize {
        self.counters.bytes_written.load(Ordering::Relaxed)
    }

    /// The number of read requests, including reads of absent keys.
    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::Relaxed)
    }

    /// The number of read requests that were restricted to a byte range.
    pub fn byte_range_reads(&self) -> usize {
        self.counters.byte_range_reads.load(Ordering::Relaxed)
    }

    /// The number of write requests.
    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::Relaxed)
    }

    /// The number of keys requested to be erased, whether or not they existed.
    ///
    /// Prefix erases are not counted.
    pub fn keys_erased(&self) -> usize {
        self.counters.keys_erased.load(Ordering::Relaxed)
    }

    fn record_read(&self, value: Result<MaybeBytes, StorageError>) -> Result<MaybeBytes, StorageError> {
        if let Ok(Some(bytes)) = &value {
            add(&self.counters.bytes_read, bytes.len());
        }
        add(&self.counters.reads, 1);
        value
    }

    fn record_write(&self, len: usize) {
        add(&self.counters.bytes_written, len);
        add(&self.counters.writes, 1);
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.record_read(self.storage.get(key))
    }

    fn get_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        add(&self.counters.byte_range_reads, 1);
        self.record_read(self.storage.get_byte_range(key, byte_range))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.storage.size_key(key)
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> ListableStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.storage.list()
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        self.storage.list_prefix(prefix)
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        self.storage.list_dir(prefix)
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        self.storage.size_prefix(prefix)
    }

    fn size(&self) -> Result<u64, StorageError> {
        self.storage.size()
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.record_write(value.len());
        self.storage.set(key, value)
    }

    fn set_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
        value: &[u8],
    ) -> Result<(), StorageError> {
        self.record_write(value.len());
        self.storage.set_byte_range(key, byte_range, value)
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        add(&self.counters.keys_erased, 1);
        self.storage.erase(key)
    }

    fn erase_values(&self, keys: &[StoreKey]) -> Result<(), StorageError> {
        add(&self.counters.keys_erased, keys.len());
        self.storage.erase_values(keys)
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.storage.erase_prefix(prefix)
    }
}
