//! The `default` chunk key encoding.

use zarrkit_metadata::{
    chunk_key_encoding::default::{DefaultChunkKeyEncodingConfiguration, IDENTIFIER},
    MetadataV3,
};

use crate::{join_indices, split_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

const PREFIX: &str = "c";

/// A `default` chunk key encoding.
///
/// The key for a chunk with grid index (k, j, i, …) is formed by taking the initial prefix `c`, and appending for each dimension:
/// - the separator character, followed by,
/// - the ASCII decimal string representation of the chunk index within that dimension.
///
/// The key of the chunk of a 0-dimensional array is `c`.
#[derive(Debug, Clone)]
pub struct DefaultChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl DefaultChunkKeyEncoding {
    /// Create a new `default` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `default` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `default` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }
}

impl Default for DefaultChunkKeyEncoding {
    /// Create a `default` chunk key encoding with default separator: `/`.
    fn default() -> Self {
        Self::new_slash()
    }
}

impl ChunkKeyEncodingTraits for DefaultChunkKeyEncoding {
    fn create_metadata(&self) -> MetadataV3 {
        let configuration = DefaultChunkKeyEncodingConfiguration {
            separator: self.separator,
        };
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> String {
        join_indices(Some(PREFIX), self.separator, chunk_grid_indices)
    }

    fn decode(&self, key: &str, dimensionality: usize) -> Option<Vec<u64>> {
        let remainder = key.strip_prefix(PREFIX)?;
        if remainder.is_empty() {
            return (dimensionality == 0).then(Vec::new);
        }
        let remainder = remainder.strip_prefix(self.separator.as_char())?;
        split_indices(remainder, self.separator, dimensionality)
    }
}
