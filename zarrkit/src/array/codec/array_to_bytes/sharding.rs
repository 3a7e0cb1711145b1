//! The `sharding_indexed` array to bytes codec.
//!
//! Sharding logically splits chunks (shards) into sub-chunks (inner chunks) that can be individually compressed and accessed.
//! This allows chunk sizes to be large enough for efficient storage while keeping the granularity of reads small.
//!
//! An encoded shard holds the encoded inner chunks back to back followed (or preceded) by the shard index.
//! The shard index has an `(offset, nbytes)` pair of `u64` for each inner chunk in C order.
//! Inner chunks that were never written (or are entirely the fill value and [`store_empty_chunks`](crate::array::codec::CodecOptions::store_empty_chunks) is disabled) are omitted and their index entries are `(u64::MAX, u64::MAX)`.
//! The index is encoded with its own codec chain which must produce a fixed size, by default little endian `bytes` then `crc32c`.
//!
//! Partial decoding reads the shard index with one byte range request, then only the byte ranges of the inner chunks that intersect the requested subset.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/sharding-indexed/index.html>
//!
//! ### Codec `configuration` Example - [`ShardingCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "chunk_shape": [32, 32],
//!     "codecs": [
//!         { "name": "bytes", "configuration": { "endian": "little" } },
//!         { "name": "gzip", "configuration": { "level": 1 } }
//!     ],
//!     "index_codecs": [
//!         { "name": "bytes", "configuration": { "endian": "little" } },
//!         { "name": "crc32c" }
//!     ],
//!     "index_location": "end"
//! }
//! # "#;
//! # use zarrkit::metadata::codec::sharding::ShardingCodecConfiguration;
//! # serde_json::from_str::<ShardingCodecConfiguration>(JSON).unwrap();
//! ```

mod sharding_codec;
mod sharding_codec_builder;

use std::num::NonZeroU64;

pub use sharding_codec::ShardingCodec;
pub use sharding_codec_builder::ShardingCodecBuilder;
pub use zarrkit_metadata::codec::sharding::{
    ShardingCodecConfiguration, ShardingCodecConfigurationV1, ShardingIndexLocation,
};

use zarrkit_chunk_grid::{check_dimensionality, ChunkShape};
use zarrkit_storage::byte_range::ByteRange;

use crate::array::{
    codec::{CodecChain, CodecError},
    BytesRepresentation, ChunkRepresentation, DataType, FillValue,
};

/// Calculate the number of inner chunks per shard along each dimension.
///
/// # Errors
/// Returns a [`CodecError`] if the dimensionalities differ or `inner_chunk_shape` does not evenly divide `shard_shape`.
fn calculate_chunks_per_shard(
    shard_shape: &[NonZeroU64],
    inner_chunk_shape: &[NonZeroU64],
) -> Result<ChunkShape, CodecError> {
    check_dimensionality(inner_chunk_shape.len(), shard_shape.len())?;
    std::iter::zip(shard_shape, inner_chunk_shape)
        .map(|(s, c)| {
            let (s, c) = (s.get(), c.get());
            if s % c == 0 {
                NonZeroU64::new(s / c)
            } else {
                None
            }
        })
        .collect::<Option<ChunkShape>>()
        .ok_or_else(|| {
            CodecError::InvalidConfiguration(format!(
                "the inner chunk shape {inner_chunk_shape:?} does not evenly divide the shard shape {shard_shape:?}"
            ))
        })
}

/// The representation of the shard index, with shape `chunks_per_shard` + `[2]`.
fn sharding_index_representation(
    chunks_per_shard: &[NonZeroU64],
) -> Result<ChunkRepresentation, CodecError> {
    let mut index_shape = chunks_per_shard.to_vec();
    index_shape.push(NonZeroU64::MIN.saturating_add(1));
    ChunkRepresentation::new(index_shape, DataType::UInt64, FillValue::from(u64::MAX))
        .map_err(|err| CodecError::Other(err.to_string()))
}

/// Compute the encoded size of the shard index.
///
/// # Errors
/// Returns [`CodecError::InvalidConfiguration`] if the index codecs do not produce a fixed size output.
fn compute_index_encoded_size(
    index_codecs: &CodecChain,
    index_representation: &ChunkRepresentation,
) -> Result<u64, CodecError> {
    match index_codecs.encoded_representation(index_representation)? {
        BytesRepresentation::FixedSize(size) => Ok(size),
        _ => Err(CodecError::InvalidConfiguration(
            "the sharding index codecs must produce a fixed size output".to_string(),
        )),
    }
}

/// The byte range of the encoded shard index within an encoded shard.
fn index_byte_range(index_location: ShardingIndexLocation, index_encoded_size: u64) -> ByteRange {
    match index_location {
        ShardingIndexLocation::Start => ByteRange::from_start(0, Some(index_encoded_size)),
        ShardingIndexLocation::End => ByteRange::suffix(index_encoded_size),
    }
}

/// The `(offset, nbytes)` of inner chunk `chunk_index` in a decoded shard index, or [`None`] if it is absent.
fn index_entry(shard_index: &[u64], chunk_index: usize) -> Option<(u64, u64)> {
    let offset = *shard_index.get(chunk_index.checked_mul(2)?)?;
    let nbytes = *shard_index.get(chunk_index.checked_mul(2)?.checked_add(1)?)?;
    (offset != u64::MAX || nbytes != u64::MAX).then_some((offset, nbytes))
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, sync::Arc};

    use zarrkit_chunk_grid::ArraySubset;
    use zarrkit_storage::{
        store::MemoryStore, storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter,
        Bytes, StoreKey, WritableStorageTraits,
    };

    use super::*;
    use crate::array::{
        codec::{
            ArrayToBytesCodecTraits, BytesCodec, CodecOptions, CodecTraits, Crc32cCodec,
        },
        ValueHandle,
    };

    const JSON_VALID1: &str = r#"{
        "chunk_shape": [2, 2],
        "codecs": [
            { "name": "bytes", "configuration": { "endian": "little" } }
        ],
        "index_codecs": [
            { "name": "bytes", "configuration": { "endian": "little" } },
            { "name": "crc32c" }
        ]
    }"#;

    const JSON_VALID2: &str = r#"{
        "chunk_shape": [2, 2],
        "codecs": [
            { "name": "bytes", "configuration": { "endian": "big" } },
            { "name": "crc32c" }
        ],
        "index_codecs": [
            { "name": "bytes", "configuration": { "endian": "little" } }
        ],
        "index_location": "start"
    }"#;

    #[cfg(feature = "gzip")]
    const JSON_VALID3: &str = r#"{
        "chunk_shape": [2, 2],
        "codecs": [
            { "name": "bytes", "configuration": { "endian": "little" } },
            { "name": "gzip", "configuration": { "level": 1 } }
        ]
    }"#;

    const JSON_NESTED: &str = r#"{
        "chunk_shape": [2, 4],
        "codecs": [
            {
                "name": "sharding_indexed",
                "configuration": {
                    "chunk_shape": [1, 2],
                    "codecs": [
                        { "name": "bytes", "configuration": { "endian": "little" } }
                    ]
                }
            }
        ]
    }"#;

    fn codec(json: &str) -> ShardingCodec {
        let configuration: ShardingCodecConfiguration = serde_json::from_str(json).unwrap();
        ShardingCodec::new_with_configuration(&configuration).unwrap()
    }

    fn shard_representation(shape: &[u64], fill_value: u16) -> ChunkRepresentation {
        ChunkRepresentation::new(
            shape.iter().map(|&s| NonZeroU64::new(s).unwrap()).collect(),
            DataType::UInt16,
            FillValue::from(fill_value),
        )
        .unwrap()
    }

    fn elements(range: std::ops::Range<u16>) -> Vec<u8> {
        range.flat_map(u16::to_ne_bytes).collect()
    }

    fn codec_sharding_round_trip_impl(json: &str, options: &CodecOptions) {
        let codec = codec(json);
        let representation = shard_representation(&[4, 4], 0);
        let bytes = elements(0..16);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, options)
            .unwrap();
        let decoded = codec.decode(encoded, &representation, options).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_sharding_round_trip1() {
        codec_sharding_round_trip_impl(JSON_VALID1, &CodecOptions::default());
    }

    #[test]
    fn codec_sharding_round_trip2() {
        codec_sharding_round_trip_impl(JSON_VALID2, &CodecOptions::default());
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn codec_sharding_round_trip3() {
        codec_sharding_round_trip_impl(JSON_VALID3, &CodecOptions::default());
    }

    #[test]
    fn codec_sharding_round_trip_nested() {
        codec_sharding_round_trip_impl(JSON_NESTED, &CodecOptions::default());
    }

    #[test]
    fn codec_sharding_round_trip_concurrent() {
        let options = CodecOptions::default().with_concurrent_target(4);
        codec_sharding_round_trip_impl(JSON_VALID1, &options);
        codec_sharding_round_trip_impl(JSON_NESTED, &options);
    }

    #[test]
    fn codec_sharding_metadata() {
        let codec = codec(JSON_VALID2);
        let metadata = codec.create_metadata();
        assert_eq!(metadata.name(), "sharding_indexed");
        let configuration: ShardingCodecConfiguration = metadata.to_configuration().unwrap();
        let ShardingCodecConfiguration::V1(configuration) = configuration;
        assert_eq!(configuration.index_location, ShardingIndexLocation::Start);
        assert_eq!(configuration.codecs.len(), 2);
        assert_eq!(configuration.index_codecs.len(), 1);
    }

    #[test]
    fn codec_sharding_layout_end() {
        // 2x2 inner chunks of 8 bytes, index of 4 entries * 16 bytes + crc32c
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 0);
        let bytes = elements(1..17);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &CodecOptions::default())
            .unwrap();
        assert_eq!(encoded.len(), 4 * 8 + 4 * 16 + 4);

        let index = &encoded[encoded.len() - 68..encoded.len() - 4];
        let index: Vec<u64> = index
            .chunks_exact(8)
            .map(|entry| u64::from_le_bytes(entry.try_into().unwrap()))
            .collect();
        assert_eq!(index, vec![0, 8, 8, 8, 16, 8, 24, 8]);

        // The first inner chunk holds elements [0..2, 0..2]
        assert_eq!(&encoded[..8], &[1, 0, 2, 0, 5, 0, 6, 0]);
    }

    #[test]
    fn codec_sharding_layout_start() {
        let codec = codec(JSON_VALID2);
        let representation = shard_representation(&[4, 4], 0);
        let bytes = elements(1..17);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &CodecOptions::default())
            .unwrap();
        // Inner chunks are 8 bytes + crc32c, the index is 64 bytes at the start
        assert_eq!(encoded.len(), 64 + 4 * 12);
        assert_eq!(u64::from_le_bytes(encoded[..8].try_into().unwrap()), 64);
        assert_eq!(u64::from_le_bytes(encoded[8..16].try_into().unwrap()), 12);
        // big endian inner chunks
        assert_eq!(&encoded[64..72], &[0, 1, 0, 2, 0, 5, 0, 6]);
    }

    #[test]
    fn codec_sharding_empty_inner_chunks() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 9);
        let mut bytes = 9u16.to_ne_bytes().repeat(16);
        // only the last inner chunk differs from the fill value
        bytes[30..32].copy_from_slice(&3u16.to_ne_bytes());

        let options = CodecOptions::default().with_store_empty_chunks(false);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &options)
            .unwrap();
        assert_eq!(encoded.len(), 8 + 68);
        let decoded = codec
            .decode(encoded.clone(), &representation, &options)
            .unwrap();
        assert_eq!(decoded, bytes);

        let options = CodecOptions::default().with_store_empty_chunks(true);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &options)
            .unwrap();
        assert_eq!(encoded.len(), 4 * 8 + 68);
    }

    #[test]
    fn codec_sharding_invalid_inner_chunk_shape() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 3], 0);
        assert!(matches!(
            codec.encoded_representation(&representation),
            Err(CodecError::InvalidConfiguration(_))
        ));
        let representation = shard_representation(&[4], 0);
        assert!(codec.encoded_representation(&representation).is_err());
    }

    #[test]
    fn codec_sharding_encoded_representation() {
        let representation = shard_representation(&[4, 4], 0);
        assert_eq!(
            codec(JSON_VALID1)
                .encoded_representation(&representation)
                .unwrap(),
            BytesRepresentation::BoundedSize(4 * 8 + 68)
        );
        #[cfg(feature = "gzip")]
        assert_eq!(
            codec(JSON_VALID3)
                .encoded_representation(&representation)
                .unwrap(),
            BytesRepresentation::BoundedSize(4 * (8 + 18 + 5) + 68)
        );
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn codec_sharding_index_must_be_fixed_size() {
        let codec = ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
            .index_bytes_to_bytes_codecs(vec![crate::array::codec::GzipCodec::new(1)
                .unwrap()
                .into()])
            .build();
        let representation = shard_representation(&[4, 4], 0);
        assert!(matches!(
            codec.encoded_representation(&representation),
            Err(CodecError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn codec_sharding_corrupt_index() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 0);
        let bytes = elements(0..16);
        let mut encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &CodecOptions::default())
            .unwrap()
            .into_owned();
        let index_start = encoded.len() - 68;
        encoded[index_start] ^= 1;
        assert!(matches!(
            codec.decode(Cow::Owned(encoded), &representation, &CodecOptions::default()),
            Err(CodecError::InvalidChecksum)
        ));
    }

    #[test]
    fn codec_sharding_index_out_of_bounds() {
        // index codecs without a checksum so that the corrupt index decodes
        let codec = ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
            .index_bytes_to_bytes_codecs(vec![])
            .build();
        let representation = shard_representation(&[4, 4], 0);
        let bytes = elements(0..16);
        let mut encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &CodecOptions::default())
            .unwrap()
            .into_owned();
        let index_start = encoded.len() - 64;
        encoded[index_start..index_start + 8].copy_from_slice(&1000u64.to_le_bytes());
        assert!(matches!(
            codec.decode(Cow::Owned(encoded), &representation, &CodecOptions::default()),
            Err(CodecError::ShardIndexOutOfBounds)
        ));
    }

    #[test]
    fn codec_sharding_truncated() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 0);
        assert!(codec
            .decode(Cow::Owned(vec![0; 10]), &representation, &CodecOptions::default())
            .is_err());
    }

    #[test]
    fn codec_sharding_partial_decode() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 0);
        let options = CodecOptions::default();
        let bytes = elements(0..16);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &options)
            .unwrap()
            .into_owned();

        let store = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
            MemoryStore::new(),
        )));
        let key = StoreKey::new("shard").unwrap();
        store.set(&key, Bytes::from(encoded)).unwrap();
        let input_handle = ValueHandle::new_stored(store.clone(), key);

        let subset = ArraySubset::new_with_ranges(&[1..3, 0..1]);
        let decoded = codec
            .partial_decode(&input_handle, &representation, &subset, &options)
            .unwrap();
        assert_eq!(decoded, elements(4..5).into_iter().chain(elements(8..9)).collect::<Vec<_>>());
        // the index, then one element from each of two inner chunks
        assert_eq!(store.bytes_read(), 68 + 2 + 2);

        // the whole shard decodes identically through the partial path
        let full = ArraySubset::new_with_shape(vec![4, 4]);
        assert_eq!(
            codec
                .partial_decode(&input_handle, &representation, &full, &options)
                .unwrap(),
            bytes
        );
    }

    #[test]
    fn codec_sharding_partial_decode_absent() {
        let codec = codec(JSON_VALID1);
        let representation = shard_representation(&[4, 4], 7);
        let subset = ArraySubset::new_with_ranges(&[0..1, 1..3]);
        let decoded = codec
            .partial_decode(
                &ValueHandle::absent(),
                &representation,
                &subset,
                &CodecOptions::default(),
            )
            .unwrap();
        assert_eq!(decoded, 7u16.to_ne_bytes().repeat(2));
    }

    #[test]
    fn codec_sharding_partial_decode_nested() {
        let codec = codec(JSON_NESTED);
        let representation = shard_representation(&[4, 4], 0);
        let options = CodecOptions::default();
        let bytes = elements(0..16);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &representation, &options)
            .unwrap();
        let input_handle = ValueHandle::from_bytes(encoded.into_owned());
        let subset = ArraySubset::new_with_ranges(&[3..4, 1..4]);
        let decoded = codec
            .partial_decode(&input_handle, &representation, &subset, &options)
            .unwrap();
        assert_eq!(decoded, elements(13..16));
    }

    #[test]
    fn codec_sharding_builder() {
        let codec = ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
            .array_to_bytes_codec(BytesCodec::big().into())
            .bytes_to_bytes_codecs(vec![Crc32cCodec::new().into()])
            .index_location(ShardingIndexLocation::Start)
            .build();
        assert_eq!(codec.inner_codecs().bytes_to_bytes_codecs().len(), 1);
        assert_eq!(codec.index_location(), ShardingIndexLocation::Start);
        codec_sharding_round_trip_impl(
            &serde_json::to_string(codec.create_metadata().configuration().unwrap()).unwrap(),
            &CodecOptions::default(),
        );
    }

    #[test]
    fn sharding_chunks_per_shard() {
        let shape = |s: &[u64]| -> ChunkShape {
            s.iter().map(|&s| NonZeroU64::new(s).unwrap()).collect()
        };
        assert_eq!(
            calculate_chunks_per_shard(&shape(&[4, 6]), &shape(&[2, 3])).unwrap(),
            shape(&[2, 2])
        );
        assert!(calculate_chunks_per_shard(&shape(&[4, 6]), &shape(&[3, 3])).is_err());
        assert!(calculate_chunks_per_shard(&shape(&[2]), &shape(&[4])).is_err());
        assert!(calculate_chunks_per_shard(&shape(&[4, 6]), &shape(&[2])).is_err());
    }

    #[test]
    fn sharding_index_entry() {
        let index = [0, 8, u64::MAX, u64::MAX, 8, 0];
        assert_eq!(index_entry(&index, 0), Some((0, 8)));
        assert_eq!(index_entry(&index, 1), None);
        assert_eq!(index_entry(&index, 2), Some((8, 0)));
        assert_eq!(index_entry(&index, 3), None);
    }
}
