//! An array to bytes codec formed by joining an array to array sequence, array to bytes, and bytes to bytes sequence of codecs.

use std::borrow::Cow;

use zarrkit_chunk_grid::{ArraySubset, IndexerError};
use zarrkit_metadata::MetadataV3;

use crate::array::{
    array_bytes::validate_bytes_len,
    codec::{
        ArrayToArrayCodec, ArrayToArrayCodecTraits, ArrayToBytesCodec, ArrayToBytesCodecTraits,
        BytesToBytesCodec, BytesToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecTraits,
    },
    ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes, ValueHandle,
};

/// A codec chain is a sequence of array to array, a bytes to bytes, and a sequence of array to bytes codecs.
///
/// The chain always holds exactly one array to bytes codec.
/// The representation of a chunk between each codec is derived from the decoded chunk representation on demand.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_array: Vec<ArrayToArrayCodec>,
    array_to_bytes: ArrayToBytesCodec,
    bytes_to_bytes: Vec<BytesToBytesCodec>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_array: Vec<ArrayToArrayCodec>,
        array_to_bytes: ArrayToBytesCodec,
        bytes_to_bytes: Vec<BytesToBytesCodec>,
    ) -> Self {
        Self {
            array_to_array,
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a new codec chain from a list of metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if:
    ///  - a codec could not be created,
    ///  - no array to bytes codec is supplied,
    ///  - more than one array to bytes codec is supplied, or
    ///  - the codecs are not ordered array to array, array to bytes, then bytes to bytes.
    pub fn from_metadata(metadatas: &[MetadataV3]) -> Result<Self, CodecError> {
        let mut array_to_array: Vec<ArrayToArrayCodec> = vec![];
        let mut array_to_bytes: Option<ArrayToBytesCodec> = None;
        let mut bytes_to_bytes: Vec<BytesToBytesCodec> = vec![];
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToArray(codec) => {
                    if array_to_bytes.is_some() {
                        return Err(CodecError::InvalidConfiguration(format!(
                            "array to array codec {metadata} follows the array to bytes codec"
                        )));
                    }
                    array_to_array.push(codec);
                }
                Codec::ArrayToBytes(codec) => {
                    if array_to_bytes.is_some() {
                        return Err(CodecError::InvalidConfiguration(
                            "multiple array to bytes codecs".to_string(),
                        ));
                    }
                    array_to_bytes = Some(codec);
                }
                Codec::BytesToBytes(codec) => {
                    if array_to_bytes.is_none() {
                        return Err(CodecError::InvalidConfiguration(format!(
                            "bytes to bytes codec {metadata} precedes the array to bytes codec"
                        )));
                    }
                    bytes_to_bytes.push(codec);
                }
            }
        }

        array_to_bytes.map_or_else(
            || {
                Err(CodecError::InvalidConfiguration(
                    "missing array to bytes codec".to_string(),
                ))
            },
            |array_to_bytes| Ok(Self::new(array_to_array, array_to_bytes, bytes_to_bytes)),
        )
    }

    /// Create codec chain metadata.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<MetadataV3> {
        let mut metadatas =
            Vec::with_capacity(self.array_to_array.len() + 1 + self.bytes_to_bytes.len());
        for codec in &self.array_to_array {
            metadatas.push(codec.create_metadata());
        }
        metadatas.push(self.array_to_bytes.create_metadata());
        for codec in &self.bytes_to_bytes {
            metadatas.push(codec.create_metadata());
        }
        metadatas
    }

    /// Get the array to array codecs
    #[must_use]
    pub fn array_to_array_codecs(&self) -> &[ArrayToArrayCodec] {
        &self.array_to_array
    }

    /// Get the array to bytes codec
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &ArrayToBytesCodec {
        &self.array_to_bytes
    }

    /// Get the bytes to bytes codecs
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[BytesToBytesCodec] {
        &self.bytes_to_bytes
    }

    fn get_array_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<ChunkRepresentation>, CodecError> {
        let mut array_representations = Vec::with_capacity(self.array_to_array.len() + 1);
        let mut representation = decoded_representation.clone();
        for codec in &self.array_to_array {
            let encoded_representation = codec.encoded_representation(&representation)?;
            array_representations.push(representation);
            representation = encoded_representation;
        }
        array_representations.push(representation);
        Ok(array_representations)
    }

    fn get_bytes_representations(
        &self,
        array_representation: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut bytes_representations = Vec::with_capacity(self.bytes_to_bytes.len() + 1);
        let mut representation = self
            .array_to_bytes
            .encoded_representation(array_representation)?;
        for codec in &self.bytes_to_bytes {
            let encoded_representation = codec.encoded_representation(&representation);
            bytes_representations.push(representation);
            representation = encoded_representation;
        }
        bytes_representations.push(representation);
        Ok(bytes_representations)
    }

    /// Returns the encoded representation of a chunk with `decoded_representation`.
    ///
    /// This walks every codec of the chain, so it also validates that each codec supports its input.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if a codec does not support its input representation.
    pub fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let array_representations = self.get_array_representations(decoded_representation)?;
        let bytes_representations = self.get_bytes_representations(last(&array_representations)?)?;
        Ok(*last(&bytes_representations)?)
    }

    /// Validate that the codec chain supports chunks with `decoded_representation`.
    ///
    /// Checks the transpose order dimensionality, the `bytes` codec endianness, and that sharding inner chunk shapes divide the shard shape.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if a codec does not support its input representation.
    pub fn validate(&self, decoded_representation: &ChunkRepresentation) -> Result<(), CodecError> {
        self.encoded_representation(decoded_representation)
            .map(|_| ())
    }

    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with `decoded_representation`.
    pub fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        validate_bytes_len(&decoded_value, decoded_representation.size())?;
        let array_representations = self.get_array_representations(decoded_representation)?;

        // array->array
        let mut value = decoded_value;
        for (codec, representation) in std::iter::zip(&self.array_to_array, &array_representations)
        {
            value = codec.encode(value, representation, options)?;
        }

        // array->bytes
        let mut value =
            self.array_to_bytes
                .encode(value, last(&array_representations)?, options)?;

        // bytes->bytes
        for codec in &self.bytes_to_bytes {
            value = codec.encode(value, options)?;
        }

        Ok(value)
    }

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    pub fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let array_representations = self.get_array_representations(decoded_representation)?;
        let array_representation = last(&array_representations)?;
        let bytes_representations = self.get_bytes_representations(array_representation)?;

        // bytes->bytes
        let mut value = encoded_value;
        for (codec, bytes_representation) in std::iter::zip(
            self.bytes_to_bytes.iter().rev(),
            bytes_representations.iter().rev().skip(1),
        ) {
            value = codec.decode(value, bytes_representation, options)?;
        }

        // bytes->array
        let mut value = self
            .array_to_bytes
            .decode(value, array_representation, options)?;

        // array->array
        for (codec, representation) in std::iter::zip(
            self.array_to_array.iter().rev(),
            array_representations.iter().rev().skip(1),
        ) {
            value = codec.decode(value, representation, options)?;
        }

        validate_bytes_len(&value, decoded_representation.size())?;
        Ok(value)
    }

    /// Returns true if [`partial_decode`](CodecChain::partial_decode) reads only part of its input.
    ///
    /// This is the case if the chain is a lone array to bytes codec that supports partial decoding, such as `bytes` or `sharding_indexed`.
    #[must_use]
    pub fn supports_partial_decode(&self) -> bool {
        self.array_to_array.is_empty()
            && self.bytes_to_bytes.is_empty()
            && self.array_to_bytes.supports_partial_decode()
    }

    /// Decode the subset `array_subset` of a chunk from `input_handle`.
    ///
    /// A chunk absent from `input_handle` decodes to the fill value.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails, `array_subset` is out of bounds of the chunk, or reading the input fails.
    pub fn partial_decode(
        &self,
        input_handle: &ValueHandle<'_>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        if self.supports_partial_decode() {
            return self.array_to_bytes.partial_decode(
                input_handle,
                decoded_representation,
                array_subset,
                options,
            );
        }

        let chunk_shape = decoded_representation.shape_u64();
        if !array_subset.inbounds_shape(&chunk_shape) {
            return Err(IndexerError::new_oob(array_subset.clone(), chunk_shape).into());
        }
        match input_handle.to_maybe_bytes()? {
            Some(encoded_value) => {
                let decoded_value =
                    self.decode(Cow::Borrowed(&encoded_value[..]), decoded_representation, options)?;
                Ok(Cow::Owned(array_subset.extract_bytes(
                    &decoded_value,
                    &chunk_shape,
                    decoded_representation.element_size(),
                )?))
            }
            None => {
                let num_elements = usize::try_from(array_subset.num_elements()).unwrap_or(usize::MAX);
                Ok(Cow::Owned(
                    decoded_representation.fill_value().repeat(num_elements),
                ))
            }
        }
    }
}

fn last<T>(representations: &[T]) -> Result<&T, CodecError> {
    representations
        .last()
        .ok_or_else(|| CodecError::from("codec chain has no representations"))
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU64, sync::Arc};

    use zarrkit_storage::{store::MemoryStore, ReadableStorageTraits, StoreKey, WritableStorageTraits};

    use super::*;
    use crate::array::{DataType, FillValue};

    #[cfg(feature = "transpose")]
    const JSON_TRANSPOSE1: &str = r#"{
    "name": "transpose",
    "configuration": {
      "order": [0, 2, 1]
    }
}"#;

    #[cfg(feature = "transpose")]
    const JSON_TRANSPOSE2: &str = r#"{
    "name": "transpose",
    "configuration": {
        "order": [2, 0, 1]
    }
}"#;

    const JSON_BYTES: &str = r#"{
    "name": "bytes",
    "configuration": {
        "endian": "big"
    }
}"#;

    #[cfg(feature = "gzip")]
    const JSON_GZIP: &str = r#"{
    "name": "gzip",
    "configuration": {
        "level": 1
    }
}"#;

    #[cfg(feature = "zstd")]
    const JSON_ZSTD: &str = r#"{
    "name": "zstd",
    "configuration": {
        "level": 1,
        "checksum": false
    }
}"#;

    const JSON_CRC32C: &str = r#"{
    "name": "crc32c"
}"#;

    fn chunk_representation() -> ChunkRepresentation {
        ChunkRepresentation::new(
            vec![
                NonZeroU64::new(2).unwrap(),
                NonZeroU64::new(2).unwrap(),
                NonZeroU64::new(2).unwrap(),
            ],
            DataType::Float32,
            FillValue::from(0f32),
        )
        .unwrap()
    }

    fn metadatas(jsons: &[&str]) -> Vec<MetadataV3> {
        jsons
            .iter()
            .map(|json| serde_json::from_str(json).unwrap())
            .collect()
    }

    #[test]
    fn codec_chain_round_trip() {
        let elements: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let bytes: Vec<u8> = elements.iter().flat_map(|e| e.to_ne_bytes()).collect();
        let chunk_representation = chunk_representation();

        let codec_configurations = metadatas(&[
            #[cfg(feature = "transpose")]
            JSON_TRANSPOSE1,
            #[cfg(feature = "transpose")]
            JSON_TRANSPOSE2,
            JSON_BYTES,
            #[cfg(feature = "gzip")]
            JSON_GZIP,
            #[cfg(feature = "zstd")]
            JSON_ZSTD,
            JSON_CRC32C,
        ]);
        let codec = CodecChain::from_metadata(&codec_configurations).unwrap();
        assert_eq!(codec.create_metadatas(), codec_configurations);
        codec.validate(&chunk_representation).unwrap();

        let encoded = codec
            .encode(
                Cow::Borrowed(&bytes),
                &chunk_representation,
                &CodecOptions::default(),
            )
            .unwrap();
        assert_ne!(encoded.as_ref(), bytes.as_slice());
        let decoded = codec
            .decode(encoded.clone(), &chunk_representation, &CodecOptions::default())
            .unwrap();
        assert_eq!(bytes, decoded.as_ref());

        // Partial decoding decodes the whole chunk
        assert!(!codec.supports_partial_decode());
        let input_handle = ValueHandle::from_bytes(encoded.into_owned());
        let decoded_region = ArraySubset::new_with_ranges(&[0..2, 1..2, 0..1]);
        let decoded_partial_chunk = codec
            .partial_decode(
                &input_handle,
                &chunk_representation,
                &decoded_region,
                &CodecOptions::default(),
            )
            .unwrap();
        let decoded_partial_chunk: Vec<f32> = decoded_partial_chunk
            .chunks(size_of::<f32>())
            .map(|b| f32::from_ne_bytes(b.try_into().unwrap()))
            .collect();
        assert_eq!(decoded_partial_chunk, vec![2.0, 6.0]);
    }

    #[test]
    fn codec_chain_bytes_only_partial_decode() {
        let elements: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let bytes: Vec<u8> = elements.iter().flat_map(|e| e.to_ne_bytes()).collect();
        let chunk_representation = chunk_representation();
        let codec = CodecChain::from_metadata(&metadatas(&[JSON_BYTES])).unwrap();
        assert!(codec.supports_partial_decode());

        let encoded = codec
            .encode(
                Cow::Borrowed(&bytes),
                &chunk_representation,
                &CodecOptions::default(),
            )
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::new("c/0").unwrap();
        store.set(&key, encoded.into_owned().into()).unwrap();
        let storage: Arc<dyn ReadableStorageTraits> = store;
        let decoded = codec
            .partial_decode(
                &ValueHandle::new_stored(storage, key),
                &chunk_representation,
                &ArraySubset::new_with_ranges(&[1..2, 0..2, 1..2]),
                &CodecOptions::default(),
            )
            .unwrap();
        let decoded: Vec<f32> = decoded
            .chunks(size_of::<f32>())
            .map(|b| f32::from_ne_bytes(b.try_into().unwrap()))
            .collect();
        assert_eq!(decoded, vec![5.0, 7.0]);
    }

    #[test]
    fn codec_chain_partial_decode_absent() {
        let codec = CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_CRC32C])).unwrap();
        let chunk_representation = ChunkRepresentation::new(
            vec![NonZeroU64::new(4).unwrap()],
            DataType::UInt8,
            FillValue::from(9u8),
        )
        .unwrap();
        let decoded = codec
            .partial_decode(
                &ValueHandle::absent(),
                &chunk_representation,
                &ArraySubset::new_with_ranges(&[1..3]),
                &CodecOptions::default(),
            )
            .unwrap();
        assert_eq!(decoded.as_ref(), &[9, 9]);
        assert!(codec
            .partial_decode(
                &ValueHandle::absent(),
                &chunk_representation,
                &ArraySubset::new_with_ranges(&[1..5]),
                &CodecOptions::default(),
            )
            .is_err());
    }

    #[test]
    fn codec_chain_invalid_order() {
        assert!(CodecChain::from_metadata(&metadatas(&[])).is_err());
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_CRC32C])).is_err());
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_BYTES])).is_err());
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_CRC32C, JSON_BYTES])).is_err());
        #[cfg(feature = "transpose")]
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_TRANSPOSE1])).is_err());
    }

    #[test]
    fn codec_chain_encoded_representation() {
        let chunk_representation = chunk_representation();
        let codec = CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_CRC32C])).unwrap();
        assert_eq!(
            codec.encoded_representation(&chunk_representation).unwrap(),
            BytesRepresentation::FixedSize(32 + 4)
        );
        #[cfg(feature = "gzip")]
        {
            let codec = CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_GZIP])).unwrap();
            assert!(matches!(
                codec.encoded_representation(&chunk_representation).unwrap(),
                BytesRepresentation::BoundedSize(_)
            ));
        }
    }

    #[cfg(feature = "transpose")]
    #[test]
    fn codec_chain_validate_transpose_dimensionality() {
        let codec =
            CodecChain::from_metadata(&metadatas(&[JSON_TRANSPOSE1, JSON_BYTES])).unwrap();
        let chunk_representation = ChunkRepresentation::new(
            vec![NonZeroU64::new(4).unwrap()],
            DataType::UInt8,
            FillValue::from(0u8),
        )
        .unwrap();
        assert!(codec.validate(&chunk_representation).is_err());
    }

    #[test]
    fn codec_chain_decode_truncated() {
        let codec = CodecChain::from_metadata(&metadatas(&[JSON_BYTES])).unwrap();
        assert!(matches!(
            codec.decode(
                Cow::Owned(vec![0; 31]),
                &chunk_representation(),
                &CodecOptions::default()
            ),
            Err(CodecError::UnexpectedChunkDecodedSize(31, 32))
        ));
    }
}
