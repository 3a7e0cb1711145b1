//! `zarrkit` global configuration options.

use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `zarrkit` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Validate Checksums
///  > default: [`true`]
///
/// If enabled, checksum codecs (e.g. `crc32c`) validate that encoded data matches stored checksums, otherwise validation is skipped.
///
/// ## Store Empty Chunks
///  > default: [`false`]
///
/// If disabled, a chunk whose elements all equal the fill value is erased from the store rather than written.
/// Likewise, the sharding codec omits inner chunks that are entirely the fill value.
///
/// ## Codec Concurrent Target
///  > default: `1`
///
/// The number of threads a codec may use when encoding or decoding.
/// The sharding codec encodes and decodes inner chunks in parallel if this is greater than one.
/// Store operations always run on the calling thread.
///
/// The options of any individual encode or decode operation can override these defaults, see [`CodecOptions`](crate::array::codec::CodecOptions).
#[derive(Debug, Clone)]
pub struct Config {
    validate_checksums: bool,
    store_empty_chunks: bool,
    codec_concurrent_target: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_checksums: true,
            store_empty_chunks: false,
            codec_concurrent_target: 1,
        }
    }
}

impl Config {
    /// Get the [validate checksums](#validate-checksums) configuration.
    #[must_use]
    pub fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set the [validate checksums](#validate-checksums) configuration.
    pub fn set_validate_checksums(&mut self, validate_checksums: bool) -> &mut Self {
        self.validate_checksums = validate_checksums;
        self
    }

    /// Get the [store empty chunks](#store-empty-chunks) configuration.
    #[must_use]
    pub fn store_empty_chunks(&self) -> bool {
        self.store_empty_chunks
    }

    /// Set the [store empty chunks](#store-empty-chunks) configuration.
    pub fn set_store_empty_chunks(&mut self, store_empty_chunks: bool) -> &mut Self {
        self.store_empty_chunks = store_empty_chunks;
        self
    }

    /// Get the [codec concurrent target](#codec-concurrent-target) configuration.
    #[must_use]
    pub fn codec_concurrent_target(&self) -> usize {
        self.codec_concurrent_target
    }

    /// Set the [codec concurrent target](#codec-concurrent-target) configuration.
    ///
    /// A target of zero is treated as one.
    pub fn set_codec_concurrent_target(&mut self, concurrent_target: usize) -> &mut Self {
        self.codec_concurrent_target = concurrent_target.max(1);
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `zarrkit` configuration.
///
/// A poisoned lock is recovered, the configuration holds no invariants that a panic could break.
/// This might deadlock if the global config is already held mutably by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Returns a mutable reference to the global `zarrkit` configuration.
///
/// This might deadlock if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}
