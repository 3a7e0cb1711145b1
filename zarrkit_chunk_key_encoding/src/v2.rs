//! The `v2` chunk key encoding.

use zarrkit_metadata::{
    chunk_key_encoding::v2::{V2ChunkKeyEncodingConfiguration, IDENTIFIER},
    MetadataV3,
};

use crate::{join_indices, split_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

/// A `v2` chunk key encoding.
///
/// The identifier for chunk with at least one dimension is formed by concatenating for each dimension:
/// - the ASCII decimal string representation of the chunk index within that dimension, followed by
/// - the separator character, except that it is omitted for the last dimension.
///
/// The key of the chunk of a 0-dimensional array is `0`.
#[derive(Debug, Clone)]
pub struct V2ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl V2ChunkKeyEncoding {
    /// Create a new `v2` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `v2` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `v2` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }
}

impl Default for V2ChunkKeyEncoding {
    /// Create a `v2` chunk key encoding with default separator: `.`.
    fn default() -> Self {
        Self::new_dot()
    }
}

impl ChunkKeyEncodingTraits for V2ChunkKeyEncoding {
    fn create_metadata(&self) -> MetadataV3 {
        let configuration = V2ChunkKeyEncodingConfiguration {
            separator: self.separator,
        };
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> String {
        if chunk_grid_indices.is_empty() {
            "0".to_string()
        } else {
            join_indices(None, self.separator, chunk_grid_indices)
        }
    }

    fn decode(&self, key: &str, dimensionality: usize) -> Option<Vec<u64>> {
        if dimensionality == 0 {
            (key == "0").then(Vec::new)
        } else {
            split_indices(key, self.separator, dimensionality)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_nd() {
        let chunk_key_encoding = V2ChunkKeyEncoding::new_dot();
        assert_eq!(chunk_key_encoding.encode(&[1, 23, 45]), "1.23.45");
        assert_eq!(
            chunk_key_encoding.decode("1.23.45", 3),
            Some(vec![1, 23, 45])
        );
    }

    #[test]
    fn slash_nd() {
        let chunk_key_encoding = V2ChunkKeyEncoding::new_slash();
        assert_eq!(chunk_key_encoding.encode(&[1, 23, 45]), "1/23/45");
        assert_eq!(
            chunk_key_encoding.decode("1/23/45", 3),
            Some(vec![1, 23, 45])
        );
    }

    #[test]
    fn scalar() {
        let chunk_key_encoding = V2ChunkKeyEncoding::default();
        assert_eq!(chunk_key_encoding.encode(&[]), "0");
        assert_eq!(chunk_key_encoding.decode("0", 0), Some(vec![]));
        assert_eq!(chunk_key_encoding.decode("0", 1), Some(vec![0]));
        assert_eq!(chunk_key_encoding.decode("c", 0), None);
    }

    #[test]
    fn metadata() {
        assert_eq!(
            serde_json::to_string(&V2ChunkKeyEncoding::new_slash().create_metadata()).unwrap(),
            r#"{"name":"v2","configuration":{"separator":"/"}}"#
        );
    }
}
