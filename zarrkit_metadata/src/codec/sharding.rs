//! The `sharding_indexed` codec metadata.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::{ChunkShape, Endianness, MetadataConfiguration, MetadataV3};

use super::{
    bytes::{self, BytesCodecConfigurationV1},
    crc32c,
};

/// The identifier for the `sharding_indexed` codec.
pub const IDENTIFIER: &str = "sharding_indexed";

/// A wrapper to handle various versions of Sharding codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ShardingCodecConfiguration {
    /// Version 1.0.
    V1(ShardingCodecConfigurationV1),
}

/// Sharding codec configuration parameters.
///
/// ### Example sharding codec configuration
/// ```rust
/// # let JSON = r#"
/// {
///     "chunk_shape": [32, 32, 32],
///     "codecs": [
///         {
///             "name": "bytes",
///             "configuration": {
///                 "endian": "little"
///             }
///         },
///         {
///             "name": "gzip",
///             "configuration": {
///                 "level": 1
///             }
///         }
///     ],
///     "index_codecs": [
///         {
///             "name": "bytes",
///             "configuration": {
///                 "endian": "little"
///             }
///         },
///         { "name": "crc32c" }
///     ]
/// }
/// # "#;
/// # use zarrkit_metadata::codec::sharding::ShardingCodecConfigurationV1;
/// # let configuration: ShardingCodecConfigurationV1 = serde_json::from_str(JSON).unwrap();
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ShardingCodecConfigurationV1 {
    /// An array of integers specifying the shape of the inner chunks in a shard along each dimension of the outer array.
    pub chunk_shape: ChunkShape,
    /// A list of codecs to be used for encoding and decoding inner chunks.
    pub codecs: Vec<MetadataV3>,
    /// A list of codecs to be used for encoding and decoding the shard index.
    ///
    /// Defaults to little endian `bytes` followed by `crc32c`.
    #[serde(default = "default_index_codecs")]
    pub index_codecs: Vec<MetadataV3>,
    /// Specifies whether the shard index is located at the beginning or end of the file.
    #[serde(default)]
    pub index_location: ShardingIndexLocation,
}

impl ShardingCodecConfigurationV1 {
    /// Create a new sharding codec configuration with the default index codecs and location.
    #[must_use]
    pub fn new(chunk_shape: ChunkShape, codecs: Vec<MetadataV3>) -> Self {
        Self {
            chunk_shape,
            codecs,
            index_codecs: default_index_codecs(),
            index_location: ShardingIndexLocation::default(),
        }
    }
}

/// The default shard index codecs, little endian `bytes` and `crc32c`.
#[must_use]
pub fn default_index_codecs() -> Vec<MetadataV3> {
    let bytes = MetadataV3::new_with_serializable_configuration(
        bytes::IDENTIFIER,
        &BytesCodecConfigurationV1::new(Some(Endianness::Little)),
    )
    .unwrap_or_else(|_| MetadataV3::new(bytes::IDENTIFIER));
    let crc32c =
        MetadataV3::new_with_configuration(crc32c::IDENTIFIER, MetadataConfiguration::default());
    vec![bytes, crc32c]
}

/// The sharding index location.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug, Display, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShardingIndexLocation {
    /// The index is at the start of the shard, before the chunks.
    Start,
    /// The index is at the end of the shard, after the chunks.
    #[default]
    End,
}
