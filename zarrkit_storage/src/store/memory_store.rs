//! A synchronous in-memory store.

use std::collections::{BTreeMap, BTreeSet};

use bytes::BytesMut;
use parking_lot::Mutex;

use crate::byte_range::ByteRange;
use crate::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

/// A synchronous in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    data_map: Mutex<BTreeMap<StoreKey, BytesMut>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_map: Mutex::default(),
        }
    }
}

fn to_usize(value: u64) -> Result<usize, StorageError> {
    usize::try_from(value).map_err(|_| StorageError::from("byte offset exceeds usize::MAX"))
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let data_map = self.data_map.lock();
        Ok(data_map.get(key).map(|data| data.clone().freeze()))
    }

    fn get_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        let data_map = self.data_map.lock();
        let Some(data) = data_map.get(key) else {
            return Ok(None);
        };
        let range = byte_range.to_range_usize(data.len() as u64)?;
        Ok(Some(Bytes::copy_from_slice(&data[range])))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let data_map = self.data_map.lock();
        Ok(data_map.get(key).map(|entry| entry.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock();
        data_map.insert(key.clone(), BytesMut::from(value.as_ref()));
        Ok(())
    }

    fn set_byte_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
        value: &[u8],
    ) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock();
        let size = data_map.get(key).map_or(0, BytesMut::len);
        let range = byte_range.to_write_range(size as u64, value.len() as u64)?;
        let data = data_map.entry(key.clone()).or_default();
        let (start, end) = (to_usize(range.start)?, to_usize(range.end)?);
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock();
        data_map.remove(key);
        Ok(())
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock();
        data_map.retain(|key, _| !key.has_prefix(prefix));
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        let data_map = self.data_map.lock();
        Ok(data_map.keys().cloned().collect())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let data_map = self.data_map.lock();
        Ok(data_map
            .keys()
            .filter(|&key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let mut keys: StoreKeys = vec![];
        let mut prefixes: BTreeSet<StorePrefix> = BTreeSet::default();
        let data_map = self.data_map.lock();
        for key in data_map.keys() {
            let Some(key_strip) = key.strip_prefix(prefix) else {
                continue;
            };
            match key_strip.split_once('/') {
                Some((child, _)) => {
                    prefixes.insert(StorePrefix::new(format!("{}{child}/", prefix.as_str()))?);
                }
                None => keys.push(key.clone()),
            }
        }
        Ok(StoreKeysPrefixes::new(keys, prefixes.into_iter().collect()))
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        let data_map = self.data_map.lock();
        Ok(data_map
            .iter()
            .filter(|(key, _)| key.has_prefix(prefix))
            .map(|(_, value)| value.len() as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::Arc;

    use super::*;
    use crate::ReadableWritableStorageTraits;

    #[test]
    fn memory() -> Result<(), Box<dyn Error>> {
        let store = MemoryStore::new();
        crate::store_test::store_write(&store)?;
        crate::store_test::store_read(&store)?;
        crate::store_test::store_list(&store)?;
        crate::store_test::store_set_byte_range(&store)?;
        Ok(())
    }

    #[test]
    fn memory_shared() -> Result<(), Box<dyn Error>> {
        let store: Arc<dyn ReadableWritableStorageTraits> = Arc::new(MemoryStore::new());
        crate::store_test::store_write(&store)?;
        crate::store_test::store_read(&store)?;
        crate::store_test::store_set_byte_range(&store)?;
        Ok(())
    }

    #[test]
    fn memory_get_byte_range() -> Result<(), Box<dyn Error>> {
        let store = MemoryStore::new();
        let key = StoreKey::new("a")?;
        assert!(store.get_byte_range(&key, &ByteRange::from(0..1))?.is_none());
        store.set(&key, vec![0, 1, 2, 3, 4].into())?;
        assert_eq!(
            store.get_byte_range(&key, &ByteRange::new(-3, Some(-1)))?,
            Some(vec![2, 3].into())
        );
        assert!(store.get_byte_range(&key, &ByteRange::from(3..6)).is_err());
        Ok(())
    }
}
