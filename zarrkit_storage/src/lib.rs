//! Key/value storage for [`zarrkit`](https://docs.rs/zarrkit/latest/zarrkit/index.html) arrays.
//!
//! An array keeps its `zarr.json` metadata document and its encoded chunks under string keys.
//! Anything that can map a [`StoreKey`] to bytes can back an array: a directory tree, a map in memory, an object bucket.
//!
//! | Trait                     | Operations                                         |
//! |---------------------------|----------------------------------------------------|
//! | [`ReadableStorageTraits`] | `get`, `get_byte_range`, `get_byte_ranges`, `size_key` |
//! | [`WritableStorageTraits`] | `set`, `set_byte_range`, `erase`, `erase_prefix`   |
//! | [`ListableStorageTraits`] | `list`, `list_prefix`, `list_dir`, `size_prefix`   |
//!
//! A missing key reads as [`None`] rather than an error.
//! See [`byte_range`] for how ranges past the end of a value are resolved.
//!
//! [`store::MemoryStore`] is provided here.
//! The [`storage_adapter`] module wraps any store to log its operations or count the bytes it moves.

use std::sync::Arc;

use thiserror::Error;

pub mod byte_range;
pub mod storage_adapter;
mod storage_handle;
mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;


use byte_range::InvalidByteRangeError;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

pub use self::storage_sync::{
    ListableStorageTraits, ReadableStorageTraits, ReadableWritableStorageTraits,
    WritableStorageTraits,
};

pub use self::storage_handle::StorageHandle;

/// A shared readable store.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// A stored value.
pub type Bytes = bytes::Bytes;

/// A stored value, or [`None`] if the key is absent.
pub type MaybeBytes = Option<Bytes>;

/// The keys and child prefixes directly under a prefix, as returned by [`ListableStorageTraits::list_dir`].
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StoreKeysPrefixes {
    keys: StoreKeys,
    prefixes: StorePrefixes,
}

impl StoreKeysPrefixes {
    /// Pair listed keys with listed prefixes.
    #[must_use]
    pub fn new(keys: StoreKeys, prefixes: StorePrefixes) -> Self {
        Self { keys, prefixes }
    }

    /// Keys directly under the listed prefix.
    #[must_use]
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Child prefixes, each ending in `/`.
    #[must_use]
    pub const fn prefixes(&self) -> &StorePrefixes {
        &self.prefixes
    }
}

/// A storage error.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The store was opened read only.
    #[error("the store is read only")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// The document at a key is not valid metadata.
    #[error("invalid metadata at {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid byte range.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// The store does not implement the operation.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
