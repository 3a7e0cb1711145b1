//! The `crc32c` codec metadata.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `crc32c` codec.
pub const IDENTIFIER: &str = "crc32c";

/// A wrapper to handle various versions of `crc32c` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum Crc32cCodecConfiguration {
    /// Version 1.0.
    V1(Crc32cCodecConfigurationV1),
}

/// `crc32c` codec configuration parameters (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct Crc32cCodecConfigurationV1 {}

#[cfg(test)]
mod tests {
    use crate::MetadataV3;

    use super::*;

    #[test]
    fn codec_crc32c_config1() {
        serde_json::from_str::<Crc32cCodecConfiguration>(r"{}").unwrap();
    }

    #[test]
    fn codec_crc32c_config_outer() {
        let metadata = serde_json::from_str::<MetadataV3>(r#"{"name": "crc32c"}"#).unwrap();
        metadata
            .to_configuration::<Crc32cCodecConfiguration>()
            .unwrap();
    }

    #[test]
    fn codec_crc32c_config_invalid() {
        assert!(serde_json::from_str::<Crc32cCodecConfiguration>(r#"{"location":"end"}"#).is_err());
    }
}
