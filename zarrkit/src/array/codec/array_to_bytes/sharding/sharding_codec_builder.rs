use zarrkit_chunk_grid::ChunkShape;

use super::{ShardingCodec, ShardingIndexLocation};
use crate::array::codec::{
    ArrayToArrayCodec, ArrayToBytesCodec, BytesCodec, BytesToBytesCodec, CodecChain, Crc32cCodec,
};

/// A [`ShardingCodec`] builder.
///
/// By default, the inner chunks are encoded with the `bytes` codec with native endian encoding.
/// The index is encoded with the `bytes` codec with little endian encoding, additionally with the `crc32c` checksum codec.
///
/// Use the methods in the `sharding` codec builder to change the configuration away from these defaults, and then build the `sharding` codec with [`build`](ShardingCodecBuilder::build).
#[derive(Debug)]
pub struct ShardingCodecBuilder {
    inner_chunk_shape: ChunkShape,
    index_array_to_bytes_codec: ArrayToBytesCodec,
    index_bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    array_to_array_codecs: Vec<ArrayToArrayCodec>,
    array_to_bytes_codec: ArrayToBytesCodec,
    bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    index_location: ShardingIndexLocation,
}

impl ShardingCodecBuilder {
    /// Create a new `sharding` codec builder.
    #[must_use]
    pub fn new(inner_chunk_shape: ChunkShape) -> Self {
        Self {
            inner_chunk_shape,
            index_array_to_bytes_codec: BytesCodec::little().into(),
            index_bytes_to_bytes_codecs: vec![Crc32cCodec::new().into()],
            array_to_array_codecs: Vec::default(),
            array_to_bytes_codec: BytesCodec::default().into(),
            bytes_to_bytes_codecs: Vec::default(),
            index_location: ShardingIndexLocation::default(),
        }
    }

    /// Set the index array to bytes codec.
    ///
    /// If left unmodified, the index will be encoded with the `bytes` codec with little endian encoding.
    pub fn index_array_to_bytes_codec(
        &mut self,
        index_array_to_bytes_codec: ArrayToBytesCodec,
    ) -> &mut Self {
        self.index_array_to_bytes_codec = index_array_to_bytes_codec;
        self
    }

    /// Set the index bytes to bytes codecs.
    ///
    /// If left unmodified, the index will be encoded with the `crc32c` checksum codec.
    pub fn index_bytes_to_bytes_codecs(
        &mut self,
        index_bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    ) -> &mut Self {
        self.index_bytes_to_bytes_codecs = index_bytes_to_bytes_codecs;
        self
    }

    /// Set the inner chunk array to array codecs.
    ///
    /// If left unmodified, no array to array codecs will be applied for the inner chunks.
    pub fn array_to_array_codecs(
        &mut self,
        array_to_array_codecs: Vec<ArrayToArrayCodec>,
    ) -> &mut Self {
        self.array_to_array_codecs = array_to_array_codecs;
        self
    }

    /// Set the inner chunk array to bytes codec.
    ///
    /// If left unmodified, the inner chunks will be encoded with the `bytes` codec with native endian encoding.
    pub fn array_to_bytes_codec(&mut self, array_to_bytes_codec: ArrayToBytesCodec) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the inner chunk bytes to bytes codecs.
    ///
    /// If left unmodified, no bytes to bytes codecs will be applied for the inner chunks.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the index location.
    ///
    /// If left unmodified, defaults to the end of the shard.
    pub fn index_location(&mut self, index_location: ShardingIndexLocation) -> &mut Self {
        self.index_location = index_location;
        self
    }

    /// Build into a [`ShardingCodec`].
    #[must_use]
    pub fn build(&self) -> ShardingCodec {
        let inner_codecs = CodecChain::new(
            self.array_to_array_codecs.clone(),
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );
        let index_codecs = CodecChain::new(
            vec![],
            self.index_array_to_bytes_codec.clone(),
            self.index_bytes_to_bytes_codecs.clone(),
        );
        ShardingCodec::new(
            self.inner_chunk_shape.clone(),
            inner_codecs,
            index_codecs,
            self.index_location,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;
    use crate::array::codec::CodecTraits;

    #[test]
    fn sharding_codec_builder_defaults() {
        let codec = ShardingCodecBuilder::new(vec![NonZeroU64::new(4).unwrap()]).build();
        assert_eq!(codec.chunk_shape(), &[NonZeroU64::new(4).unwrap()]);
        assert_eq!(codec.index_location(), ShardingIndexLocation::End);
        assert_eq!(
            serde_json::to_string(&codec.index_codecs().create_metadatas()).unwrap(),
            r#"[{"name":"bytes","configuration":{"endian":"little"}},{"name":"crc32c"}]"#
        );
        assert_eq!(codec.create_metadata().name(), "sharding_indexed");
    }
}
