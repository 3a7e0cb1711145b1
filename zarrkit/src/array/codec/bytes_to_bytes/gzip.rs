//! The `gzip` bytes to bytes codec.
//!
//! Applies [gzip](https://datatracker.ietf.org/doc/html/rfc1952) compression.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/gzip/index.html>
//!
//! ### Codec `configuration` Example - [`GzipCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "level": 1
//! }
//! # "#;
//! # use zarrkit::metadata::codec::gzip::GzipCodecConfiguration;
//! # let configuration: GzipCodecConfiguration = serde_json::from_str(JSON).unwrap();
//! ```

mod gzip_codec;

pub use gzip_codec::GzipCodec;
pub use zarrkit_metadata::codec::gzip::{
    GzipCodecConfiguration, GzipCodecConfigurationV1, GzipCompressionLevel,
    GzipCompressionLevelError,
};

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecOptions, CodecTraits},
        BytesRepresentation,
    };

    const JSON_VALID: &str = r#"{
        "level": 1
    }"#;

    #[test]
    fn codec_gzip_configuration_valid() {
        assert!(serde_json::from_str::<GzipCodecConfiguration>(JSON_VALID).is_ok());
    }

    #[test]
    fn codec_gzip_configuration_invalid1() {
        const JSON_INVALID1: &str = r#"{
        "level": -1
    }"#;
        assert!(serde_json::from_str::<GzipCodecConfiguration>(JSON_INVALID1).is_err());
    }

    #[test]
    fn codec_gzip_configuration_invalid2() {
        const JSON_INVALID2: &str = r#"{
        "level": 10
    }"#;
        assert!(serde_json::from_str::<GzipCodecConfiguration>(JSON_INVALID2).is_err());
        assert!(GzipCodec::new(10).is_err());
    }

    #[test]
    fn codec_gzip_round_trip() {
        let bytes: Vec<u8> = (0..1024).map(|i| (i % 7) as u8).collect();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec_configuration: GzipCodecConfiguration =
            serde_json::from_str(JSON_VALID).unwrap();
        let codec = GzipCodec::new_with_configuration(&codec_configuration);
        assert_eq!(
            serde_json::to_string(&codec.create_metadata()).unwrap(),
            r#"{"name":"gzip","configuration":{"level":1}}"#
        );

        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        assert!(encoded.len() < bytes.len());
        let BytesRepresentation::BoundedSize(bound) =
            codec.encoded_representation(&bytes_representation)
        else {
            panic!("gzip should have a bounded size");
        };
        assert!(encoded.len() as u64 <= bound);

        let decoded = codec
            .decode(encoded, &bytes_representation, &CodecOptions::default())
            .unwrap();
        assert_eq!(bytes, decoded.as_ref());
    }
}
