//! The `zstd` codec metadata.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The identifier for the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

/// A wrapper to handle various versions of `zstd` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ZstdCodecConfiguration {
    /// Version 1.0.
    V1(ZstdCodecConfigurationV1),
}

/// `zstd` codec configuration parameters (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ZstdCodecConfigurationV1 {
    /// The compression level.
    #[serde(default)]
    pub level: ZstdCompressionLevel,
    /// A boolean that indicates whether to store a checksum when writing that will be verified when reading.
    #[serde(default)]
    pub checksum: bool,
}

impl ZstdCodecConfigurationV1 {
    /// Create a new `zstd` codec configuration given a [`ZstdCompressionLevel`].
    #[must_use]
    pub const fn new(level: ZstdCompressionLevel, checksum: bool) -> Self {
        Self { level, checksum }
    }
}

/// A `Zstd` compression level. An integer from -131072 to 22 which controls the speed and level of compression (has no impact on decoding).
///
/// A value of 0 indicates to use the default compression level.
/// Otherwise, a higher level is expected to achieve a higher compression ratio at the cost of lower speed.
/// The default level is 10.
#[derive(Serialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
pub struct ZstdCompressionLevel(i32);

impl Default for ZstdCompressionLevel {
    fn default() -> Self {
        Self(10)
    }
}

impl<'de> serde::Deserialize<'de> for ZstdCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        if let Value::Number(number) = Value::deserialize(d)? {
            if let Some(number) = number.as_i64() {
                if (-131_072..=22).contains(&number) {
                    #[allow(clippy::cast_possible_truncation)]
                    return Ok(Self(number as i32));
                }
            }
        }
        Err(serde::de::Error::custom(
            "Zstd compression level must be an integer between -131072 and 22",
        ))
    }
}

impl From<i32> for ZstdCompressionLevel {
    /// The level is clamped to the valid range.
    fn from(level: i32) -> Self {
        Self(level.clamp(-131_072, 22))
    }
}

impl ZstdCompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}
