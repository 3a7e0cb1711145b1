//! A storage adapter which logs storage method calls.

use std::{io::Write, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;

use crate::{
    byte_range::ByteRange, Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits,
    StorageError, StoreKey, StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

/// The usage log storage adapter. Logs storage method calls.
///
/// It is intended to aid in debugging and optimising performance by revealing storage access patterns.
///
/// ### Example (log to stdout)
/// ```rust
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use zarrkit_storage::store::MemoryStore;
/// # use zarrkit_storage::storage_adapter::usage_log::UsageLogStorageAdapter;
/// let store = Arc::new(MemoryStore::new());
/// let log_writer = Arc::new(Mutex::new(std::io::stdout()));
/// let store = Arc::new(UsageLogStorageAdapter::new(store, log_writer, || "[usage] ".to_string()));
/// ```
///
/// Applying array methods with the above [`UsageLogStorageAdapter`] prints outputs like:
/// ```text
/// [usage] set(array/c/1/0, len=140) -> Ok(())
/// [usage] get_byte_range(array/c/0/0, -36..) -> len=Ok(36)
/// [usage] get_byte_range(array/c/0/0, 52..104) -> len=Ok(52)
/// [usage] get(array/c/1/0) -> len=Ok(140)
/// [usage] list() -> [array/c/0/0, array/c/1/0, array/zarr.json]
/// ```
pub struct UsageLogStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    handle: Arc<Mutex<dyn Write + Send + Sync>>,
    prefix_func: fn() -> String,
}

impl<TStorage: ?Sized> core::fmt::Debug for UsageLogStorageAdapter<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TStorage: ?Sized> UsageLogStorageAdapter<TStorage> {
    /// Create a new usage log storage adapter.
    ///
    /// Each line written to `handle` is prefixed with the output of `prefix_func`.
    pub fn new(
        storage: Arc<TStorage>,
        handle: Arc<Mutex<dyn Write + Send + Sync>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            storage,
            handle,
            prefix_func,
        }
    }

    fn log(&self, args: std::fmt::Arguments) -> Result<(), StorageError> {
        writeln!(self.handle.lock(), "{}{args}", (self.prefix_func)())?;
        Ok(())
    }
}

fn maybe_len(result: &Result<MaybeBytes, StorageError>) -> Result<usize, &StorageError> {
    result.as_ref().map(|v| v.as_ref().map_or(0, Bytes::len))
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let result = self.storage.get(key);
        self.log(format_args!("get({key}) -> len={:?}", maybe_len(&result)))?;
        result
    }

    fn get_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        let result = self.storage.get_byte_range(key, byte_range);
        self.log(format_args!(
            "get_byte_range({key}, {byte_range}) -> len={:?}",
            maybe_len(&result)
        ))?;
        result
    }

    fn get_byte_ranges(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let result = self.storage.get_byte_ranges(key, byte_ranges);
        self.log(format_args!(
            "get_byte_ranges({key}, [{}]) -> len={:?}",
            byte_ranges.iter().format(", "),
            result.as_ref().map(|v| {
                v.as_ref()
                    .map_or(vec![], |v| v.iter().map(Bytes::len).collect_vec())
            })
        ))?;
        result
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let result = self.storage.size_key(key);
        self.log(format_args!("size_key({key}) -> {result:?}"))?;
        result
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> ListableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn list(&self) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list();
        self.log(format_args!(
            "list() -> [{}]",
            result.as_ref().map_or(String::new(), |keys| keys.iter().join(", "))
        ))?;
        result
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list_prefix(prefix);
        self.log(format_args!(
            "list_prefix({prefix}) -> [{}]",
            result.as_ref().map_or(String::new(), |keys| keys.iter().join(", "))
        ))?;
        result
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let result = self.storage.list_dir(prefix);
        self.log(format_args!(
            "list_dir({prefix}) -> {}",
            result.as_ref().map_or(String::new(), |keys_prefixes| format!(
                "(keys:[{}], prefixes:[{}])",
                keys_prefixes.keys().iter().join(", "),
                keys_prefixes.prefixes().iter().join(", ")
            ))
        ))?;
        result
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        let result = self.storage.size_prefix(prefix);
        self.log(format_args!("size_prefix({prefix}) -> {result:?}"))?;
        result
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let len = value.len();
        let result = self.storage.set(key, value);
        self.log(format_args!("set({key}, len={len}) -> {result:?}"))?;
        result
    }

    fn set_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
        value: &[u8],
    ) -> Result<(), StorageError> {
        let result = self.storage.set_byte_range(key, byte_range, value);
        self.log(format_args!(
            "set_byte_range({key}, {byte_range}, len={}) -> {result:?}",
            value.len()
        ))?;
        result
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let result = self.storage.erase(key);
        self.log(format_args!("erase({key}) -> {result:?}"))?;
        result
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        let result = self.storage.erase_prefix(prefix);
        self.log(format_args!("erase_prefix({prefix}) -> {result:?}"))?;
        result
    }
}
