use std::borrow::Cow;

use zarrkit_metadata::{codec::zstd::IDENTIFIER, MetadataV3};

use super::{ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel};
use crate::array::{
    codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
    BytesRepresentation, RawBytes,
};

/// A `zstd` codec implementation.
#[derive(Clone, Debug)]
pub struct ZstdCodec {
    compression: ZstdCompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    ///
    /// The compression level is clamped to the valid range.
    #[must_use]
    pub fn new(compression: i32, checksum: bool) -> Self {
        Self {
            compression: compression.into(),
            checksum,
        }
    }

    /// Create a new `zstd` codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        let ZstdCodecConfiguration::V1(configuration) = configuration;
        Self {
            compression: configuration.level,
            checksum: configuration.checksum,
        }
    }
}

impl CodecTraits for ZstdCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        let configuration = ZstdCodecConfigurationV1::new(self.compression, self.checksum);
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }
}

impl BytesToBytesCodecTraits for ZstdCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // https://github.com/facebook/zstd/blob/dev/doc/zstd_compression_format.md
                const HEADER_TRAILER_OVERHEAD: u64 = 4 + 14 + 4;
                const MIN_WINDOW_SIZE: u64 = 1000; // 1KB
                const BLOCK_OVERHEAD: u64 = 3;
                let blocks_overhead = BLOCK_OVERHEAD * size.div_ceil(MIN_WINDOW_SIZE).max(1);
                BytesRepresentation::BoundedSize(size + HEADER_TRAILER_OVERHEAD + blocks_overhead)
            })
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut compressor = zstd::bulk::Compressor::new(self.compression.as_i32())?;
        compressor.include_checksum(self.checksum)?;
        let result = compressor.compress(&decoded_value)?;
        Ok(Cow::Owned(result))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        // The upper bound is only known if the frame header records the content size
        if let Some(upper_bound) = zstd::bulk::Decompressor::upper_bound(&encoded_value) {
            let mut result = zstd::bulk::decompress(&encoded_value, upper_bound)?;
            result.shrink_to_fit();
            Ok(Cow::Owned(result))
        } else {
            zstd::decode_all(std::io::Cursor::new(&encoded_value))
                .map_err(CodecError::IOError)
                .map(Cow::Owned)
        }
    }
}
