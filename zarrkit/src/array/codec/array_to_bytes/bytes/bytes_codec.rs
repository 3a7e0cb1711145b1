use std::borrow::Cow;

use zarrkit_chunk_grid::{ArraySubset, IndexerError};
use zarrkit_metadata::{codec::bytes::IDENTIFIER, MetadataV3};
use zarrkit_storage::byte_range::ByteRange;

use super::{reverse_endianness, BytesCodecConfiguration, BytesCodecConfigurationV1, Endianness};
use crate::array::{
    array_bytes::validate_bytes_len,
    codec::{ArrayToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
    ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes, ValueHandle,
};

/// A `bytes` codec implementation.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::new(Some(Endianness::native()))
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional because an 8-bit type has no endianness.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        let BytesCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.endian)
    }

    /// Returns true if elements of `decoded_representation` must be byte swapped.
    fn needs_swap(&self, decoded_representation: &ChunkRepresentation) -> Result<bool, CodecError> {
        if decoded_representation.element_size() <= 1 {
            return Ok(false);
        }
        match self.endian {
            Some(endian) => Ok(!endian.is_native()),
            None => Err(CodecError::InvalidConfiguration(format!(
                "the bytes codec requires an endianness for data type {}",
                decoded_representation.data_type()
            ))),
        }
    }

    fn do_encode_or_decode<'a>(
        &self,
        value: Cow<'a, [u8]>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Cow<'a, [u8]>, CodecError> {
        validate_bytes_len(&value, decoded_representation.size())?;
        if self.needs_swap(decoded_representation)? {
            let mut value = value.into_owned();
            reverse_endianness(&mut value, decoded_representation.element_size());
            Ok(Cow::Owned(value))
        } else {
            Ok(value)
        }
    }
}

impl CodecTraits for BytesCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        let configuration = BytesCodecConfigurationV1::new(self.endian);
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }
}

impl ArrayToBytesCodecTraits for BytesCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.needs_swap(decoded_representation)?;
        Ok(BytesRepresentation::FixedSize(decoded_representation.size()))
    }

    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.do_encode_or_decode(decoded_value, decoded_representation)
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.do_encode_or_decode(encoded_value, decoded_representation)
    }

    fn supports_partial_decode(&self) -> bool {
        true
    }

    fn partial_decode(
        &self,
        input_handle: &ValueHandle<'_>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        let chunk_shape = decoded_representation.shape_u64();
        if !array_subset.inbounds_shape(&chunk_shape) {
            return Err(IndexerError::new_oob(array_subset.clone(), chunk_shape).into());
        }
        let element_size = decoded_representation.element_size();
        let num_elements = usize::try_from(array_subset.num_elements()).unwrap_or(usize::MAX);

        // Read each contiguous run of elements separately
        let mut decoded = Vec::with_capacity(num_elements.saturating_mul(element_size));
        for byte_range in array_subset.iter_contiguous_byte_ranges(&chunk_shape, element_size)? {
            match input_handle.get(&ByteRange::from(byte_range))?.to_maybe_bytes()? {
                Some(bytes) => decoded.extend_from_slice(&bytes),
                None => {
                    return Ok(Cow::Owned(
                        decoded_representation.fill_value().repeat(num_elements),
                    ))
                }
            }
        }
        validate_bytes_len(&decoded, array_subset.num_elements() * element_size as u64)?;
        if self.needs_swap(decoded_representation)? {
            reverse_endianness(&mut decoded, element_size);
        }
        Ok(Cow::Owned(decoded))
    }
}
