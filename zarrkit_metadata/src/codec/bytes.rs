//! The `bytes` codec metadata.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::Endianness;

/// The identifier for the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

/// The deprecated alias of the `bytes` codec.
pub const IDENTIFIER_ENDIAN: &str = "endian";

/// A wrapper to handle various versions of `bytes` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum BytesCodecConfiguration {
    /// Version 1.0.
    V1(BytesCodecConfigurationV1),
}

/// Configuration parameters for the `bytes` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BytesCodecConfigurationV1 {
    /// The target endianness. Required if the data type is larger than one byte.
    /// A string equal to either "big" or "little" in JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endianness>,
}

impl BytesCodecConfigurationV1 {
    /// Create a new `bytes` codec configuration given an optional [`Endianness`].
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }
}
