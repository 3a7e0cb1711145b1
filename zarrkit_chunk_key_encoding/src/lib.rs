//! The chunk key encoding API for the [`zarrkit`](https://docs.rs/zarrkit/latest/zarrkit/index.html) crate.
//!
//! A chunk key encoding maps the indices of a chunk in the chunk grid to the name of the key holding the chunk in a store.
//! The mapping is deterministic and injective for a given dimensionality, so keys can be decoded back to chunk indices.
//!
//! Supported encodings:
//!  - [`DefaultChunkKeyEncoding`]: `c/1/2` (the separator is configurable, default `/`),
//!  - [`V2ChunkKeyEncoding`]: `1.2` (the separator is configurable, default `.`).
//!
//! ## Licence
//! `zarrkit_chunk_key_encoding` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod default;
mod v2;

use std::sync::Arc;

use derive_more::{Deref, From};
use itertools::Itertools;
use thiserror::Error;
use zarrkit_metadata::{ConfigurationInvalidError, MetadataV3};
use zarrkit_storage::{StoreKey, StoreKeyError, StorePrefix};

pub use default::DefaultChunkKeyEncoding;
pub use v2::V2ChunkKeyEncoding;
pub use zarrkit_metadata::chunk_key_encoding::ChunkKeySeparator;

/// A chunk key encoding creation error.
#[derive(Clone, Debug, Error)]
pub enum ChunkKeyEncodingCreateError {
    /// An unsupported chunk key encoding.
    #[error("chunk key encoding {0} is not supported")]
    Unsupported(String),
    /// An invalid chunk key encoding configuration.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigurationInvalidError),
}

/// Chunk key encoding traits.
pub trait ChunkKeyEncodingTraits: core::fmt::Debug + Send + Sync {
    /// Create the metadata of the chunk key encoding.
    fn create_metadata(&self) -> MetadataV3;

    /// Encode chunk grid indices into the name of a chunk key.
    fn encode(&self, chunk_grid_indices: &[u64]) -> String;

    /// Decode the name of a chunk key into chunk grid indices with `dimensionality` dimensions.
    ///
    /// Returns [`None`] if `key` is not a key produced by this encoding.
    fn decode(&self, key: &str, dimensionality: usize) -> Option<Vec<u64>>;
}

/// A chunk key encoding.
#[derive(Debug, Clone, From, Deref)]
pub struct ChunkKeyEncoding(Arc<dyn ChunkKeyEncodingTraits>);

impl ChunkKeyEncoding {
    /// Create a chunk key encoding.
    pub fn new<T: ChunkKeyEncodingTraits + 'static>(chunk_key_encoding: T) -> Self {
        let chunk_key_encoding: Arc<dyn ChunkKeyEncodingTraits> = Arc::new(chunk_key_encoding);
        chunk_key_encoding.into()
    }

    /// Create a chunk key encoding from metadata.
    ///
    /// # Errors
    /// Returns [`ChunkKeyEncodingCreateError`] if the metadata is invalid or not a supported chunk key encoding.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, ChunkKeyEncodingCreateError> {
        use zarrkit_metadata::chunk_key_encoding::{default, v2};
        match metadata.name() {
            default::IDENTIFIER => {
                let configuration: default::DefaultChunkKeyEncodingConfiguration =
                    metadata.to_configuration()?;
                Ok(DefaultChunkKeyEncoding::new(configuration.separator).into())
            }
            v2::IDENTIFIER => {
                let configuration: v2::V2ChunkKeyEncodingConfiguration =
                    metadata.to_configuration()?;
                Ok(V2ChunkKeyEncoding::new(configuration.separator).into())
            }
            name => Err(ChunkKeyEncodingCreateError::Unsupported(name.to_string())),
        }
    }

    /// Return the store key of the chunk at `chunk_grid_indices` for an array stored under `prefix`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if the key is not a valid store key.
    pub fn chunk_key(
        &self,
        prefix: &StorePrefix,
        chunk_grid_indices: &[u64],
    ) -> Result<StoreKey, StoreKeyError> {
        StoreKey::new_with_prefix(prefix, &self.encode(chunk_grid_indices))
    }
}

impl<T> From<T> for ChunkKeyEncoding
where
    T: ChunkKeyEncodingTraits + 'static,
{
    fn from(chunk_key_encoding: T) -> Self {
        Self::new(chunk_key_encoding)
    }
}

/// Join chunk grid indices with `separator`, preceded by `prefix` if set.
fn join_indices(prefix: Option<&str>, separator: ChunkKeySeparator, chunk_grid_indices: &[u64]) -> String {
    // Avoid a heap allocation of the chunk key separator
    let mut separator_str: [u8; 4] = [0; 4];
    let separator_str: &str = separator.as_char().encode_utf8(&mut separator_str);

    // Use itoa for integer conversion, faster than format!
    let mut buffers = vec![itoa::Buffer::new(); chunk_grid_indices.len()];
    let iter = chunk_grid_indices
        .iter()
        .zip(&mut buffers)
        .map(|(&n, buffer)| buffer.format(n));
    prefix.into_iter().chain(iter).join(separator_str)
}

/// Split `key` on `separator` and parse each component as a chunk grid index.
///
/// Only canonical decimal integers (no sign, no leading zeros) are accepted.
fn split_indices(key: &str, separator: ChunkKeySeparator, dimensionality: usize) -> Option<Vec<u64>> {
    let indices = key
        .split(separator.as_char())
        .map(|component| {
            let canonical = !component.is_empty()
                && component.bytes().all(|b| b.is_ascii_digit())
                && (component == "0" || !component.starts_with('0'));
            canonical.then(|| component.parse::<u64>().ok()).flatten()
        })
        .collect::<Option<Vec<u64>>>()?;
    (indices.len() == dimensionality).then_some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_encoding_from_metadata() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name":"default","configuration":{"separator":"."}}"#)
                .unwrap();
        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata).unwrap();
        assert_eq!(chunk_key_encoding.encode(&[1, 2]), "c.1.2");
        assert_eq!(chunk_key_encoding.create_metadata(), metadata);

        let metadata: MetadataV3 = serde_json::from_str(r#"{"name":"v2"}"#).unwrap();
        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata).unwrap();
        assert_eq!(chunk_key_encoding.encode(&[1, 2]), "1.2");

        let metadata: MetadataV3 = serde_json::from_str(r#""default""#).unwrap();
        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata).unwrap();
        assert_eq!(chunk_key_encoding.encode(&[1, 2]), "c/1/2");
    }

    #[test]
    fn chunk_key_encoding_from_metadata_invalid() {
        let metadata: MetadataV3 = serde_json::from_str(r#""unknown""#).unwrap();
        assert!(matches!(
            ChunkKeyEncoding::from_metadata(&metadata),
            Err(ChunkKeyEncodingCreateError::Unsupported(_))
        ));
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name":"default","configuration":{"separator":"-"}}"#)
                .unwrap();
        assert!(matches!(
            ChunkKeyEncoding::from_metadata(&metadata),
            Err(ChunkKeyEncodingCreateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn chunk_key_encoding_chunk_key() {
        let chunk_key_encoding: ChunkKeyEncoding = DefaultChunkKeyEncoding::default().into();
        let prefix = StorePrefix::new("group/array/").unwrap();
        assert_eq!(
            chunk_key_encoding.chunk_key(&prefix, &[1, 23, 45]).unwrap(),
            StoreKey::new("group/array/c/1/23/45").unwrap()
        );
        assert_eq!(
            chunk_key_encoding
                .chunk_key(&StorePrefix::root(), &[1, 23, 45])
                .unwrap(),
            StoreKey::new("c/1/23/45").unwrap()
        );
    }

    #[test]
    fn split_indices_canonical() {
        let sep = ChunkKeySeparator::Slash;
        assert_eq!(split_indices("1/23", sep, 2), Some(vec![1, 23]));
        assert_eq!(split_indices("0/0", sep, 2), Some(vec![0, 0]));
        assert_eq!(split_indices("01/23", sep, 2), None);
        assert_eq!(split_indices("+1/23", sep, 2), None);
        assert_eq!(split_indices("1//23", sep, 2), None);
        assert_eq!(split_indices("1/23", sep, 3), None);
        assert_eq!(split_indices("1.23", sep, 2), None);
    }
}
