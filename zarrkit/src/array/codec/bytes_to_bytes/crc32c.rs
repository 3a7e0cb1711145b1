//! The `crc32c` bytes to bytes codec.
//!
//! Appends a CRC32C checksum of the input bytestream.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/crc32c/index.html>
//!
//! ### Codec `configuration` Example - [`Crc32cCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {}
//! # "#;
//! # use zarrkit::metadata::codec::crc32c::Crc32cCodecConfiguration;
//! # serde_json::from_str::<Crc32cCodecConfiguration>(JSON).unwrap();
//! ```

mod crc32c_codec;

pub use crc32c_codec::Crc32cCodec;
pub use zarrkit_metadata::codec::crc32c::{Crc32cCodecConfiguration, Crc32cCodecConfigurationV1};

const CHECKSUM_SIZE: usize = size_of::<u32>();

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
        BytesRepresentation,
    };

    const JSON1: &str = r"{}";

    #[test]
    fn codec_crc32c_configuration() {
        let codec_configuration: Crc32cCodecConfiguration = serde_json::from_str(JSON1).unwrap();
        let codec = Crc32cCodec::new_with_configuration(&codec_configuration);
        assert_eq!(
            serde_json::to_string(&codec.create_metadata()).unwrap(),
            r#"{"name":"crc32c"}"#
        );
    }

    #[test]
    fn codec_crc32c() {
        let elements: Vec<u8> = (0..6).collect();
        let bytes = elements;
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec = Crc32cCodec::new();

        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        let decoded = codec
            .decode(
                encoded.clone(),
                &bytes_representation,
                &CodecOptions::default(),
            )
            .unwrap();
        assert_eq!(bytes, decoded.as_ref());

        // Check that the checksum is little endian and appended
        let checksum: &[u8; 4] = &encoded[encoded.len() - CHECKSUM_SIZE..].try_into().unwrap();
        assert_eq!(checksum, &[20, 133, 9, 65]);
        assert_eq!(
            codec.encoded_representation(&bytes_representation),
            BytesRepresentation::FixedSize(10)
        );
    }

    #[test]
    fn codec_crc32c_corrupt() {
        let bytes: Vec<u8> = (0..6).collect();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        let codec = Crc32cCodec::new();
        let mut encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap()
            .into_owned();
        encoded[0] ^= 0xff;

        assert!(matches!(
            codec.decode(
                Cow::Borrowed(&encoded),
                &bytes_representation,
                &CodecOptions::default()
            ),
            Err(CodecError::InvalidChecksum)
        ));

        // Checksums are stripped but not verified if validation is disabled
        let decoded = codec
            .decode(
                Cow::Borrowed(&encoded),
                &bytes_representation,
                &CodecOptions::default().with_validate_checksums(false),
            )
            .unwrap();
        assert_eq!(decoded.len(), 6);
        assert_eq!(decoded[0], 0xff);
    }

    #[test]
    fn codec_crc32c_too_short() {
        let codec = Crc32cCodec::new();
        assert!(codec
            .decode(
                Cow::Owned(vec![0, 1, 2]),
                &BytesRepresentation::UnboundedSize,
                &CodecOptions::default()
            )
            .is_err());
    }
}
