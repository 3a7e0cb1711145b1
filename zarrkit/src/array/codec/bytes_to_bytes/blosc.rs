//! The `blosc` bytes to bytes codec.
//!
//! It uses the [blosc](https://www.blosc.org/) container format.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/blosc/index.html>
//!
//! ### Codec `configuration` Example - [`BloscCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "cname": "lz4",
//!     "clevel": 5,
//!     "shuffle": "shuffle",
//!     "typesize": 4,
//!     "blocksize": 0
//! }
//! # "#;
//! # use zarrkit::metadata::codec::blosc::BloscCodecConfiguration;
//! # let configuration: BloscCodecConfiguration = serde_json::from_str(JSON).unwrap();
//! ```

mod blosc_codec;

use std::ffi::{c_int, c_void, CStr};

use blosc_src::{
    blosc_cbuffer_validate, blosc_compress_ctx, blosc_decompress_ctx, BLOSC_MAX_OVERHEAD,
};

pub use blosc_codec::BloscCodec;
pub use zarrkit_metadata::codec::blosc::{
    BloscCodecConfiguration, BloscCodecConfigurationV1, BloscCompressionLevel,
    BloscCompressionLevelError, BloscCompressor, BloscShuffleMode,
};

use crate::array::codec::CodecError;

const fn compressor_as_cstr(compressor: BloscCompressor) -> &'static CStr {
    match compressor {
        BloscCompressor::BloscLZ => c"blosclz",
        BloscCompressor::LZ4 => c"lz4",
        BloscCompressor::LZ4HC => c"lz4hc",
        BloscCompressor::Snappy => c"snappy",
        BloscCompressor::Zlib => c"zlib",
        BloscCompressor::Zstd => c"zstd",
    }
}

fn blosc_compress_bytes(
    src: &[u8],
    clevel: BloscCompressionLevel,
    shuffle_mode: BloscShuffleMode,
    typesize: usize,
    compressor: BloscCompressor,
    blocksize: usize,
) -> Result<Vec<u8>, CodecError> {
    let destsize = src.len() + BLOSC_MAX_OVERHEAD as usize;
    let mut dest: Vec<u8> = Vec::with_capacity(destsize);
    // SAFETY: `src` and `dest` are valid for `src.len()` and `destsize` bytes respectively.
    let compressed_size = unsafe {
        blosc_compress_ctx(
            c_int::from(u8::from(clevel)),
            shuffle_mode as c_int,
            typesize.max(1),
            src.len(),
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            destsize,
            compressor_as_cstr(compressor).as_ptr(),
            blocksize,
            1,
        )
    };
    match usize::try_from(compressed_size) {
        Ok(compressed_size) if compressed_size > 0 => {
            // SAFETY: blosc initialised the first `compressed_size` bytes of `dest`.
            unsafe { dest.set_len(compressed_size) };
            dest.shrink_to_fit();
            Ok(dest)
        }
        _ => Err(CodecError::Other(format!(
            "blosc compression failed with {compressed_size} (compressor {compressor:?}, typesize {typesize}, blocksize {blocksize})"
        ))),
    }
}

/// Returns the decompressed size of `src` if it is a valid blosc buffer.
fn blosc_validate(src: &[u8]) -> Option<usize> {
    let mut destsize: usize = 0;
    // SAFETY: `src` is valid for `src.len()` bytes and `destsize` is a valid out pointer.
    let valid = unsafe {
        blosc_cbuffer_validate(
            src.as_ptr().cast::<c_void>(),
            src.len(),
            std::ptr::addr_of_mut!(destsize),
        )
    } == 0;
    valid.then_some(destsize)
}

fn blosc_decompress_bytes(src: &[u8], destsize: usize) -> Result<Vec<u8>, CodecError> {
    if destsize == 0 {
        return Ok(Vec::new());
    }
    let mut dest: Vec<u8> = Vec::with_capacity(destsize);
    // SAFETY: `src` has been validated and `dest` is valid for `destsize` bytes.
    let decompressed_size = unsafe {
        blosc_decompress_ctx(
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            destsize,
            1,
        )
    };
    match usize::try_from(decompressed_size) {
        Ok(decompressed_size) if decompressed_size == destsize => {
            // SAFETY: blosc initialised all `destsize` bytes of `dest`.
            unsafe { dest.set_len(decompressed_size) };
            Ok(dest)
        }
        _ => Err(CodecError::Other(format!(
            "blosc decompression failed with {decompressed_size}, expected {destsize} bytes"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecOptions, CodecTraits},
        BytesRepresentation,
    };

    const JSON_VALID1: &str = r#"{
        "cname": "lz4",
        "clevel": 5,
        "shuffle": "shuffle",
        "typesize": 2,
        "blocksize": 0
    }"#;

    const JSON_VALID2: &str = r#"{
        "cname": "zstd",
        "clevel": 4,
        "shuffle": "bitshuffle",
        "typesize": 2,
        "blocksize": 0
    }"#;

    fn elements_u16() -> Vec<u8> {
        (0u16..1024).flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn codec_blosc_configuration() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID1).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        assert_eq!(
            serde_json::to_string(&codec.create_metadata()).unwrap(),
            r#"{"name":"blosc","configuration":{"cname":"lz4","clevel":5,"shuffle":"shuffle","typesize":2,"blocksize":0}}"#
        );
    }

    #[test]
    fn codec_blosc_round_trip() {
        let bytes = elements_u16();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        for json in [JSON_VALID1, JSON_VALID2] {
            let configuration: BloscCodecConfiguration = serde_json::from_str(json).unwrap();
            let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
            let encoded = codec
                .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
                .unwrap();
            assert!(encoded.len() < bytes.len());
            let decoded = codec
                .decode(encoded, &bytes_representation, &CodecOptions::default())
                .unwrap();
            assert_eq!(bytes, decoded.as_ref());
        }
    }

    #[test]
    fn codec_blosc_round_trip_empty() {
        let codec = BloscCodec::new(
            BloscCompressor::BloscLZ,
            BloscCompressionLevel::try_from(5u8).unwrap(),
            None,
            BloscShuffleMode::NoShuffle,
            None,
        )
        .unwrap();
        let encoded = codec
            .encode(Cow::Owned(vec![]), &CodecOptions::default())
            .unwrap();
        let decoded = codec
            .decode(
                encoded,
                &BytesRepresentation::FixedSize(0),
                &CodecOptions::default(),
            )
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn codec_blosc_shuffle_requires_typesize() {
        assert!(BloscCodec::new(
            BloscCompressor::LZ4,
            BloscCompressionLevel::try_from(5u8).unwrap(),
            None,
            BloscShuffleMode::Shuffle,
            None,
        )
        .is_err());
        assert!(BloscCodec::new(
            BloscCompressor::LZ4,
            BloscCompressionLevel::try_from(5u8).unwrap(),
            None,
            BloscShuffleMode::BitShuffle,
            Some(0),
        )
        .is_err());
    }

    #[test]
    fn codec_blosc_corrupt() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID1).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        assert!(codec
            .decode(
                Cow::Owned(vec![1, 2, 3, 4, 5]),
                &BytesRepresentation::FixedSize(5),
                &CodecOptions::default()
            )
            .is_err());
    }

    #[test]
    fn codec_blosc_decoded_size_mismatch() {
        let bytes = elements_u16();
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_VALID1).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        assert!(codec
            .decode(
                encoded,
                &BytesRepresentation::FixedSize(bytes.len() as u64 / 2),
                &CodecOptions::default()
            )
            .is_err());
    }
}
