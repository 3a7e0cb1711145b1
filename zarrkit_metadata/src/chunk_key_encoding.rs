//! Chunk key encoding metadata.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A chunk key separator. Either `/` or `.`.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The slash '/' character.
    #[serde(rename = "/")]
    #[display("/")]
    Slash,
    /// The dot '.' character.
    #[serde(rename = ".")]
    #[display(".")]
    Dot,
}

impl ChunkKeySeparator {
    /// Return the separator as a [`char`].
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Slash => '/',
            Self::Dot => '.',
        }
    }
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        match separator {
            '/' => Ok(Self::Slash),
            '.' => Ok(Self::Dot),
            _ => Err(separator),
        }
    }
}

pub mod default {
    //! `default` chunk key encoding metadata.

    use derive_more::Display;
    use serde::{Deserialize, Serialize};

    use super::ChunkKeySeparator;

    /// The identifier for the `default` chunk key encoding.
    pub const IDENTIFIER: &str = "default";

    /// A `default` chunk key encoding configuration.
    #[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
    #[serde(deny_unknown_fields)]
    #[display("{}", serde_json::to_string(self).unwrap_or_default())]
    pub struct DefaultChunkKeyEncodingConfiguration {
        /// The chunk key separator.
        #[serde(default = "default_separator")]
        pub separator: ChunkKeySeparator,
    }

    const fn default_separator() -> ChunkKeySeparator {
        ChunkKeySeparator::Slash
    }
}

pub mod v2 {
    //! `v2` chunk key encoding metadata.

    use derive_more::Display;
    use serde::{Deserialize, Serialize};

    use super::ChunkKeySeparator;

    /// The identifier for the `v2` chunk key encoding.
    pub const IDENTIFIER: &str = "v2";

    /// A `v2` chunk key encoding configuration.
    #[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
    #[serde(deny_unknown_fields)]
    #[display("{}", serde_json::to_string(self).unwrap_or_default())]
    pub struct V2ChunkKeyEncodingConfiguration {
        /// The chunk key separator.
        #[serde(default = "v2_separator")]
        pub separator: ChunkKeySeparator,
    }

    const fn v2_separator() -> ChunkKeySeparator {
        ChunkKeySeparator::Dot
    }
}
