//! The `zstd` bytes to bytes codec.
//!
//! Applies [Zstd](https://tools.ietf.org/html/rfc8878) compression.
//!
//! ### Specification
//! - <https://github.com/zarr-developers/zarr-extensions/tree/main/codecs/zstd>
//!
//! ### Codec `configuration` Example - [`ZstdCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "level": 1,
//!     "checksum": true
//! }
//! # "#;
//! # use zarrkit::metadata::codec::zstd::ZstdCodecConfiguration;
//! # let configuration: ZstdCodecConfiguration = serde_json::from_str(JSON).unwrap();
//! ```

mod zstd_codec;

pub use zarrkit_metadata::codec::zstd::{
    ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel,
};
pub use zstd_codec::ZstdCodec;
