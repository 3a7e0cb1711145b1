//! Codec metadata.
//!
//! Each module holds the identifier and configuration of one codec.

pub mod blosc;
pub mod bytes;
pub mod crc32c;
pub mod gzip;
pub mod sharding;
pub mod transpose;
pub mod zstd;
