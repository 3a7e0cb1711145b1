//! Zarr codecs.
//!
//! Array chunks are encoded through a sequence of codecs of three kinds:
//!  - array to array ([`ArrayToArrayCodec`]): e.g. `transpose`,
//!  - array to bytes ([`ArrayToBytesCodec`]): e.g. `bytes`, `sharding_indexed`,
//!  - bytes to bytes ([`BytesToBytesCodec`]): e.g. `blosc`, `gzip`, `zstd`, `crc32c`.
//!
//! A [`CodecChain`] holds zero or more array to array codecs, exactly one array to bytes codec, and zero or more bytes to bytes codecs.
//! Encoding applies them in that order, decoding applies them in reverse.
//!
//! The set of codecs is closed: each kind is an enum with one variant per supported codec.
//! Each codec struct implements the trait of its kind ([`ArrayToArrayCodecTraits`], [`ArrayToBytesCodecTraits`], [`BytesToBytesCodecTraits`]) and the enums dispatch to them.
//!
//! Supported codecs:
//!
//! | Kind           | Name               | Struct            | Feature     |
//! |----------------|--------------------|-------------------|-------------|
//! | array to array | `transpose`        | [`TransposeCodec`] | `transpose` |
//! | array to bytes | `bytes` (`endian`) | [`BytesCodec`]    |             |
//! | array to bytes | `sharding_indexed` | [`ShardingCodec`] |             |
//! | bytes to bytes | `blosc`            | [`BloscCodec`]    | `blosc`     |
//! | bytes to bytes | `crc32c`           | [`Crc32cCodec`]   |             |
//! | bytes to bytes | `gzip`             | [`GzipCodec`]     | `gzip`      |
//! | bytes to bytes | `zstd`             | [`ZstdCodec`]     | `zstd`      |

pub mod array_to_array;
pub mod array_to_bytes;
pub mod bytes_to_bytes;
mod options;

use std::borrow::Cow;

use thiserror::Error;

use zarrkit_chunk_grid::{ArraySubset, IncompatibleDimensionalityError, IndexerError};
use zarrkit_metadata::{codec as codec_metadata, ConfigurationInvalidError, MetadataV3};
use zarrkit_storage::{byte_range::InvalidByteRangeError, StorageError};

#[cfg(feature = "transpose")]
pub use array_to_array::transpose::{TransposeCodec, TransposeOrder};
pub use array_to_bytes::{
    bytes::BytesCodec,
    codec_chain::CodecChain,
    sharding::{ShardingCodec, ShardingCodecBuilder, ShardingIndexLocation},
};
#[cfg(feature = "blosc")]
pub use bytes_to_bytes::blosc::BloscCodec;
pub use bytes_to_bytes::crc32c::Crc32cCodec;
#[cfg(feature = "gzip")]
pub use bytes_to_bytes::gzip::GzipCodec;
#[cfg(feature = "zstd")]
pub use bytes_to_bytes::zstd::ZstdCodec;
pub use options::CodecOptions;

use super::{ArrayBytes, BytesRepresentation, ChunkRepresentation, DataType, RawBytes, ValueHandle};

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid byte range was requested.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// An invalid array subset was requested.
    #[error(transparent)]
    IndexerError(#[from] IndexerError),
    /// An incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {0}, expected {1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// The shard index references bytes beyond the end of the shard.
    #[error("The shard index references out-of-bounds bytes. The chunk may be corrupted.")]
    ShardIndexOutOfBounds,
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Unsupported data type.
    #[error("unsupported data type {0} for codec {1}")]
    UnsupportedDataType(DataType, String),
    /// An unsupported codec.
    #[error("codec {0} is not supported")]
    UnsupportedCodec(String),
    /// Invalid codec configuration metadata.
    #[error(transparent)]
    ConfigurationInvalid(#[from] ConfigurationInvalidError),
    /// An invalid codec configuration for the chunk representation.
    #[error("invalid codec configuration: {0}")]
    InvalidConfiguration(String),
    /// Other.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Codec traits.
pub trait CodecTraits: Send + Sync {
    /// Returns the identifier of the codec.
    fn identifier(&self) -> &'static str;

    /// Create the metadata of the codec.
    fn create_metadata(&self) -> MetadataV3;
}

/// Traits for array to array codecs.
pub trait ArrayToArrayCodecTraits: CodecTraits {
    /// Returns the encoded chunk representation given the decoded chunk representation.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the decoded chunk representation is not supported by this codec.
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError>;

    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with `decoded_representation`.
    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode<'a>(
        &self,
        encoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError>;
}

/// Traits for array to bytes codecs.
pub trait ArrayToBytesCodecTraits: CodecTraits {
    /// Returns the size of the encoded representation given the decoded chunk representation.
    ///
    /// This also validates that the codec supports `decoded_representation`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the decoded chunk representation is not supported by this codec.
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;

    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with `decoded_representation`.
    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError>;

    /// Returns true if [`partial_decode`](ArrayToBytesCodecTraits::partial_decode) reads only part of its input.
    fn supports_partial_decode(&self) -> bool {
        false
    }

    /// Decode the subset `array_subset` of a chunk from `input_handle`.
    ///
    /// The default implementation decodes the entire chunk and extracts the subset.
    /// A chunk absent from `input_handle` decodes to the fill value.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails, `array_subset` is out of bounds of the chunk, or reading the input fails.
    fn partial_decode(
        &self,
        input_handle: &ValueHandle<'_>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        let encoded = input_handle.to_maybe_bytes()?;
        let decoded: ArrayBytes<'_> = match &encoded {
            Some(encoded) => self.decode(Cow::Borrowed(&encoded[..]), decoded_representation, options)?,
            None => Cow::Owned(decoded_representation.fill_bytes()),
        };
        Ok(Cow::Owned(array_subset.extract_bytes(
            &decoded,
            &decoded_representation.shape_u64(),
            decoded_representation.element_size(),
        )?))
    }
}

/// Traits for bytes to bytes codecs.
pub trait BytesToBytesCodecTraits: CodecTraits {
    /// Returns the size of the encoded representation given a size of the decoded representation.
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation;

    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;
}

/// An array to array codec.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ArrayToArrayCodec {
    /// The `transpose` codec.
    #[cfg(feature = "transpose")]
    Transpose(TransposeCodec),
}

/// An array to bytes codec.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ArrayToBytesCodec {
    /// The `bytes` codec.
    Bytes(BytesCodec),
    /// The `sharding_indexed` codec.
    Sharding(Box<ShardingCodec>),
}

/// A bytes to bytes codec.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum BytesToBytesCodec {
    /// The `blosc` codec.
    #[cfg(feature = "blosc")]
    Blosc(BloscCodec),
    /// The `crc32c` codec.
    Crc32c(Crc32cCodec),
    /// The `gzip` codec.
    #[cfg(feature = "gzip")]
    Gzip(GzipCodec),
    /// The `zstd` codec.
    #[cfg(feature = "zstd")]
    Zstd(ZstdCodec),
}

/// A codec of any kind.
#[derive(Debug, Clone)]
pub enum Codec {
    /// An array to array codec.
    ArrayToArray(ArrayToArrayCodec),
    /// An array to bytes codec.
    ArrayToBytes(ArrayToBytesCodec),
    /// A bytes to bytes codec.
    BytesToBytes(BytesToBytesCodec),
}

impl Codec {
    /// Create a codec from metadata.
    ///
    /// The deprecated `endian` alias of the `bytes` codec is accepted with a warning.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec is not supported or its configuration is invalid.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        match metadata.name() {
            name @ (codec_metadata::bytes::IDENTIFIER | codec_metadata::bytes::IDENTIFIER_ENDIAN) => {
                if name == codec_metadata::bytes::IDENTIFIER_ENDIAN {
                    log::warn!(
                        "the `{}` codec name is deprecated, use `{}`",
                        codec_metadata::bytes::IDENTIFIER_ENDIAN,
                        codec_metadata::bytes::IDENTIFIER
                    );
                }
                let configuration = metadata.to_configuration()?;
                Ok(Self::ArrayToBytes(
                    BytesCodec::new_with_configuration(&configuration).into(),
                ))
            }
            codec_metadata::sharding::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::ArrayToBytes(
                    ShardingCodec::new_with_configuration(&configuration)?.into(),
                ))
            }
            #[cfg(feature = "transpose")]
            codec_metadata::transpose::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::ArrayToArray(
                    TransposeCodec::new_with_configuration(&configuration).into(),
                ))
            }
            #[cfg(feature = "blosc")]
            codec_metadata::blosc::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::BytesToBytes(
                    BloscCodec::new_with_configuration(&configuration)?.into(),
                ))
            }
            codec_metadata::crc32c::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::BytesToBytes(
                    Crc32cCodec::new_with_configuration(&configuration).into(),
                ))
            }
            #[cfg(feature = "gzip")]
            codec_metadata::gzip::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::BytesToBytes(
                    GzipCodec::new_with_configuration(&configuration).into(),
                ))
            }
            #[cfg(feature = "zstd")]
            codec_metadata::zstd::IDENTIFIER => {
                let configuration = metadata.to_configuration()?;
                Ok(Self::BytesToBytes(
                    ZstdCodec::new_with_configuration(&configuration).into(),
                ))
            }
            name => Err(CodecError::UnsupportedCodec(name.to_string())),
        }
    }

    /// Create the metadata of the codec.
    #[must_use]
    pub fn create_metadata(&self) -> MetadataV3 {
        match self {
            Self::ArrayToArray(codec) => codec.create_metadata(),
            Self::ArrayToBytes(codec) => codec.create_metadata(),
            Self::BytesToBytes(codec) => codec.create_metadata(),
        }
    }
}

impl ArrayToArrayCodec {
    fn inner(&self) -> &dyn ArrayToArrayCodecTraits {
        match *self {
            #[cfg(feature = "transpose")]
            Self::Transpose(ref codec) => codec,
        }
    }
}

impl ArrayToBytesCodec {
    fn inner(&self) -> &dyn ArrayToBytesCodecTraits {
        match self {
            Self::Bytes(codec) => codec,
            Self::Sharding(codec) => codec.as_ref(),
        }
    }

    /// Returns the sharding codec if this is a `sharding_indexed` codec.
    #[must_use]
    pub fn as_sharding(&self) -> Option<&ShardingCodec> {
        if let Self::Sharding(codec) = self {
            Some(codec)
        } else {
            None
        }
    }
}

impl BytesToBytesCodec {
    fn inner(&self) -> &dyn BytesToBytesCodecTraits {
        match self {
            #[cfg(feature = "blosc")]
            Self::Blosc(codec) => codec,
            Self::Crc32c(codec) => codec,
            #[cfg(feature = "gzip")]
            Self::Gzip(codec) => codec,
            #[cfg(feature = "zstd")]
            Self::Zstd(codec) => codec,
        }
    }
}

#[cfg(feature = "transpose")]
impl From<TransposeCodec> for ArrayToArrayCodec {
    fn from(codec: TransposeCodec) -> Self {
        Self::Transpose(codec)
    }
}

impl From<BytesCodec> for ArrayToBytesCodec {
    fn from(codec: BytesCodec) -> Self {
        Self::Bytes(codec)
    }
}

impl From<ShardingCodec> for ArrayToBytesCodec {
    fn from(codec: ShardingCodec) -> Self {
        Self::Sharding(Box::new(codec))
    }
}

#[cfg(feature = "blosc")]
impl From<BloscCodec> for BytesToBytesCodec {
    fn from(codec: BloscCodec) -> Self {
        Self::Blosc(codec)
    }
}

impl From<Crc32cCodec> for BytesToBytesCodec {
    fn from(codec: Crc32cCodec) -> Self {
        Self::Crc32c(codec)
    }
}

#[cfg(feature = "gzip")]
impl From<GzipCodec> for BytesToBytesCodec {
    fn from(codec: GzipCodec) -> Self {
        Self::Gzip(codec)
    }
}

#[cfg(feature = "zstd")]
impl From<ZstdCodec> for BytesToBytesCodec {
    fn from(codec: ZstdCodec) -> Self {
        Self::Zstd(codec)
    }
}

macro_rules! impl_codec_traits_dispatch {
    ($($codec:ty),*) => {
        $(
            impl CodecTraits for $codec {
                fn identifier(&self) -> &'static str {
                    self.inner().identifier()
                }

                fn create_metadata(&self) -> MetadataV3 {
                    self.inner().create_metadata()
                }
            }
        )*
    };
}

impl_codec_traits_dispatch!(ArrayToArrayCodec, ArrayToBytesCodec, BytesToBytesCodec);

impl ArrayToArrayCodecTraits for ArrayToArrayCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        self.inner().encoded_representation(decoded_representation)
    }

    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.inner()
            .encode(decoded_value, decoded_representation, options)
    }

    fn decode<'a>(
        &self,
        encoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.inner()
            .decode(encoded_value, decoded_representation, options)
    }
}

impl ArrayToBytesCodecTraits for ArrayToBytesCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.inner().encoded_representation(decoded_representation)
    }

    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.inner()
            .encode(decoded_value, decoded_representation, options)
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.inner()
            .decode(encoded_value, decoded_representation, options)
    }

    fn supports_partial_decode(&self) -> bool {
        self.inner().supports_partial_decode()
    }

    fn partial_decode(
        &self,
        input_handle: &ValueHandle<'_>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        self.inner().partial_decode(
            input_handle,
            decoded_representation,
            array_subset,
            options,
        )
    }
}

impl BytesToBytesCodecTraits for BytesToBytesCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        self.inner().encoded_representation(decoded_representation)
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.inner().encode(decoded_value, options)
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.inner()
            .decode(encoded_value, decoded_representation, options)
    }
}
