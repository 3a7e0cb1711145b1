//! Bytes to bytes codecs.

#[cfg(feature = "blosc")]
pub mod blosc;
pub mod crc32c;
#[cfg(feature = "gzip")]
pub mod gzip;
#[cfg(feature = "zstd")]
pub mod zstd;
