use std::borrow::Cow;

use blosc_src::{blosc_get_complib_info, BLOSC_MAX_OVERHEAD};
use zarrkit_metadata::{codec::blosc::IDENTIFIER, MetadataV3};

use super::{
    blosc_compress_bytes, blosc_decompress_bytes, blosc_validate, compressor_as_cstr,
    BloscCodecConfiguration, BloscCodecConfigurationV1, BloscCompressionLevel, BloscCompressor,
    BloscShuffleMode,
};
use crate::array::{
    codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
    BytesRepresentation, RawBytes,
};

/// A `blosc` codec implementation.
#[derive(Clone, Debug)]
pub struct BloscCodec {
    cname: BloscCompressor,
    clevel: BloscCompressionLevel,
    blocksize: usize,
    shuffle_mode: BloscShuffleMode,
    typesize: Option<usize>,
}

impl BloscCodec {
    /// Create a new `blosc` codec.
    ///
    /// The block size is chosen automatically if `blocksize` is none or zero.
    /// `typesize` must be a positive integer if shuffling is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if
    ///  - the compressor is not supported, or
    ///  - `typesize` is [`None`] or zero and shuffling is enabled.
    pub fn new(
        cname: BloscCompressor,
        clevel: BloscCompressionLevel,
        blocksize: Option<usize>,
        shuffle_mode: BloscShuffleMode,
        typesize: Option<usize>,
    ) -> Result<Self, CodecError> {
        if shuffle_mode != BloscShuffleMode::NoShuffle && typesize.unwrap_or_default() == 0 {
            return Err(CodecError::InvalidConfiguration(
                "blosc typesize must be a positive integer if shuffling is enabled".to_string(),
            ));
        }

        // SAFETY: the compressor name is a nul terminated string and the out pointers may be null.
        let support = unsafe {
            blosc_get_complib_info(
                compressor_as_cstr(cname).as_ptr(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if support < 0 {
            return Err(CodecError::InvalidConfiguration(format!(
                "blosc compressor {cname:?} is not supported"
            )));
        }

        Ok(Self {
            cname,
            clevel,
            blocksize: blocksize.unwrap_or_default(),
            shuffle_mode,
            typesize,
        })
    }

    /// Create a new `blosc` codec from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the configuration is not supported.
    pub fn new_with_configuration(
        configuration: &BloscCodecConfiguration,
    ) -> Result<Self, CodecError> {
        let BloscCodecConfiguration::V1(configuration) = configuration;
        Self::new(
            configuration.cname,
            configuration.clevel,
            Some(configuration.blocksize),
            configuration.shuffle,
            configuration.typesize,
        )
    }
}

impl CodecTraits for BloscCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        let configuration = BloscCodecConfigurationV1 {
            cname: self.cname,
            clevel: self.clevel,
            shuffle: self.shuffle_mode,
            typesize: self.typesize,
            blocksize: self.blocksize,
        };
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }
}

impl BytesToBytesCodecTraits for BloscCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                BytesRepresentation::BoundedSize(size + u64::from(BLOSC_MAX_OVERHEAD))
            })
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let encoded = blosc_compress_bytes(
            &decoded_value,
            self.clevel,
            self.shuffle_mode,
            self.typesize.unwrap_or_default(),
            self.cname,
            self.blocksize,
        )?;
        Ok(Cow::Owned(encoded))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let destsize = blosc_validate(&encoded_value)
            .ok_or_else(|| CodecError::from("blosc encoded value is invalid"))?;
        // The header is untrusted, check it before allocating
        match *decoded_representation {
            BytesRepresentation::FixedSize(expected) if destsize as u64 != expected => {
                return Err(CodecError::UnexpectedChunkDecodedSize(destsize, expected));
            }
            BytesRepresentation::BoundedSize(bound) if destsize as u64 > bound => {
                return Err(CodecError::UnexpectedChunkDecodedSize(destsize, bound));
            }
            _ => {}
        }
        Ok(Cow::Owned(blosc_decompress_bytes(&encoded_value, destsize)?))
    }
}
