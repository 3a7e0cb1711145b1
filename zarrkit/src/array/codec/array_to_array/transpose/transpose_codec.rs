use zarrkit_chunk_grid::IncompatibleDimensionalityError;
use zarrkit_metadata::{codec::transpose::IDENTIFIER, MetadataV3};

use super::{
    permute, transpose_array, TransposeCodecConfiguration, TransposeCodecConfigurationV1,
    TransposeOrder,
};
use crate::array::{
    array_bytes::validate_bytes_len,
    codec::{ArrayToArrayCodecTraits, CodecError, CodecOptions, CodecTraits},
    ArrayBytes, ChunkRepresentation, ChunkShape,
};

/// A `transpose` codec implementation.
#[derive(Clone, Debug)]
pub struct TransposeCodec {
    order: TransposeOrder,
}

impl TransposeCodec {
    /// Create a new transpose codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &TransposeCodecConfiguration) -> Self {
        let TransposeCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.order.clone())
    }

    /// Create a new transpose codec.
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }

    /// Return the transpose order.
    #[must_use]
    pub const fn order(&self) -> &TransposeOrder {
        &self.order
    }

    fn encoded_shape(&self, decoded_shape: &[std::num::NonZeroU64]) -> Result<ChunkShape, CodecError> {
        permute(decoded_shape, &self.order.0).ok_or_else(|| {
            IncompatibleDimensionalityError::new(decoded_shape.len(), self.order.0.len()).into()
        })
    }
}

impl CodecTraits for TransposeCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        let configuration = TransposeCodecConfigurationV1::new(self.order.clone());
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }
}

impl ArrayToArrayCodecTraits for TransposeCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        let encoded_shape = self.encoded_shape(decoded_representation.shape())?;
        Ok(decoded_representation.with_shape(encoded_shape))
    }

    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.encoded_shape(decoded_representation.shape())?;
        validate_bytes_len(&decoded_value, decoded_representation.size())?;
        let encoded_value = transpose_array(
            &self.order.0,
            &decoded_representation.shape_u64(),
            decoded_representation.element_size(),
            &decoded_value,
        )?;
        Ok(encoded_value.into())
    }

    fn decode<'a>(
        &self,
        encoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let encoded_shape = self.encoded_shape(decoded_representation.shape())?;
        validate_bytes_len(&encoded_value, decoded_representation.size())?;
        let encoded_shape: Vec<u64> = encoded_shape.iter().map(|s| s.get()).collect();
        let decoded_value = transpose_array(
            &self.order.inverse().0,
            &encoded_shape,
            decoded_representation.element_size(),
            &encoded_value,
        )?;
        Ok(decoded_value.into())
    }
}
