use std::borrow::Cow;

use zarrkit_metadata::{codec::crc32c::IDENTIFIER, MetadataConfiguration, MetadataV3};

use super::{Crc32cCodecConfiguration, CHECKSUM_SIZE};
use crate::array::{
    codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
    BytesRepresentation, RawBytes,
};

/// A `crc32c` codec implementation.
#[derive(Clone, Debug, Default)]
pub struct Crc32cCodec;

impl Crc32cCodec {
    /// Create a new `crc32c` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Create a new `crc32c` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(_configuration: &Crc32cCodecConfiguration) -> Self {
        Self {}
    }
}

impl CodecTraits for Crc32cCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        MetadataV3::new_with_configuration(IDENTIFIER, MetadataConfiguration::default())
    }
}

impl BytesToBytesCodecTraits for Crc32cCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation {
            BytesRepresentation::FixedSize(size) => {
                BytesRepresentation::FixedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::BoundedSize(size) => {
                BytesRepresentation::BoundedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::UnboundedSize => BytesRepresentation::UnboundedSize,
        }
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let checksum = crc32c::crc32c(&decoded_value).to_le_bytes();
        let mut encoded_value: Vec<u8> = Vec::with_capacity(decoded_value.len() + checksum.len());
        encoded_value.extend_from_slice(&decoded_value);
        encoded_value.extend_from_slice(&checksum);
        Ok(Cow::Owned(encoded_value))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let Some(data_len) = encoded_value.len().checked_sub(CHECKSUM_SIZE) else {
            return Err(CodecError::Other(
                "crc32c decoder expects a 32 bit input".to_string(),
            ));
        };
        if options.validate_checksums() {
            let (data, checksum_stored) = encoded_value.split_at(data_len);
            let checksum = crc32c::crc32c(data).to_le_bytes();
            if checksum != checksum_stored {
                return Err(CodecError::InvalidChecksum);
            }
        }
        match encoded_value {
            Cow::Borrowed(encoded_value) => Ok(Cow::Borrowed(&encoded_value[..data_len])),
            Cow::Owned(mut encoded_value) => {
                encoded_value.truncate(data_len);
                Ok(Cow::Owned(encoded_value))
            }
        }
    }
}
