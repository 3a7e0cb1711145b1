//! Chunk grid metadata.

pub mod regular {
    //! `regular` chunk grid metadata.

    use derive_more::Display;
    use serde::{Deserialize, Serialize};

    use crate::ChunkShape;

    /// The identifier for the `regular` chunk grid.
    pub const IDENTIFIER: &str = "regular";

    /// Configuration parameters for a `regular` chunk grid.
    #[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
    #[serde(deny_unknown_fields)]
    #[display("{}", serde_json::to_string(self).unwrap_or_default())]
    pub struct RegularChunkGridConfiguration {
        /// The chunk shape.
        pub chunk_shape: ChunkShape,
    }

    impl From<ChunkShape> for RegularChunkGridConfiguration {
        fn from(chunk_shape: ChunkShape) -> Self {
            Self { chunk_shape }
        }
    }

}
