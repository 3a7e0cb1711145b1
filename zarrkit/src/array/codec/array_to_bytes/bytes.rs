//! The `bytes` array to bytes codec.
//!
//! Encodes arrays of fixed-size numeric data types as little endian or big endian in lexicographical order.
//! The deprecated codec name `endian` is an alias.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/bytes/index.html>
//!
//! ### Codec `configuration` Example - [`BytesCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "endian": "little"
//! }
//! # "#;
//! # use zarrkit::metadata::codec::bytes::BytesCodecConfiguration;
//! # serde_json::from_str::<BytesCodecConfiguration>(JSON).unwrap();
//! ```

mod bytes_codec;

pub use bytes_codec::BytesCodec;
pub use zarrkit_metadata::codec::bytes::{BytesCodecConfiguration, BytesCodecConfigurationV1};
pub use zarrkit_metadata::Endianness;

/// Reverse the endianness of elements of `element_size` bytes in place.
pub(crate) fn reverse_endianness(v: &mut [u8], element_size: usize) {
    if element_size > 1 {
        for element in v.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}
