use std::{borrow::Cow, num::NonZeroU64};

use rayon::prelude::*;
use zarrkit_chunk_grid::{
    ravel_indices, ArrayIndices, ArraySubset, ChunkShape, IndexerError, RegularChunkGrid,
};
use zarrkit_metadata::{codec::sharding::IDENTIFIER, MetadataV3};
use zarrkit_storage::{byte_range::ByteRange, Bytes};

use super::{
    calculate_chunks_per_shard, compute_index_encoded_size, index_byte_range, index_entry,
    sharding_index_representation, ShardingCodecConfiguration, ShardingCodecConfigurationV1,
    ShardingIndexLocation,
};
use crate::array::{
    array_bytes::validate_bytes_len,
    codec::{ArrayToBytesCodecTraits, CodecChain, CodecError, CodecOptions, CodecTraits},
    ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes, ValueHandle,
};

/// A `sharding_indexed` codec implementation.
#[derive(Clone, Debug)]
pub struct ShardingCodec {
    /// The shape of the inner chunks in a shard along each dimension of the outer array.
    chunk_shape: ChunkShape,
    /// The codecs used to encode and decode inner chunks.
    inner_codecs: CodecChain,
    /// The codecs used to encode and decode the shard index.
    index_codecs: CodecChain,
    /// Whether the shard index is located at the beginning or end of the shard.
    index_location: ShardingIndexLocation,
}

/// The layout of a shard with a particular shape.
struct ShardLayout {
    inner_representation: ChunkRepresentation,
    inner_chunk_grid: RegularChunkGrid,
    index_representation: ChunkRepresentation,
    index_encoded_size: u64,
}

impl ShardingCodec {
    /// Create a new `sharding_indexed` codec.
    #[must_use]
    pub fn new(
        chunk_shape: ChunkShape,
        inner_codecs: CodecChain,
        index_codecs: CodecChain,
        index_location: ShardingIndexLocation,
    ) -> Self {
        Self {
            chunk_shape,
            inner_codecs,
            index_codecs,
            index_location,
        }
    }

    /// Create a new `sharding_indexed` codec from configuration.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the inner or index codecs are invalid.
    pub fn new_with_configuration(
        configuration: &ShardingCodecConfiguration,
    ) -> Result<Self, CodecError> {
        let ShardingCodecConfiguration::V1(configuration) = configuration;
        let inner_codecs = CodecChain::from_metadata(&configuration.codecs)?;
        let index_codecs = CodecChain::from_metadata(&configuration.index_codecs)?;
        Ok(Self::new(
            configuration.chunk_shape.clone(),
            inner_codecs,
            index_codecs,
            configuration.index_location,
        ))
    }

    /// Return the inner chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Return the codecs of the inner chunks.
    #[must_use]
    pub const fn inner_codecs(&self) -> &CodecChain {
        &self.inner_codecs
    }

    /// Return the codecs of the shard index.
    #[must_use]
    pub const fn index_codecs(&self) -> &CodecChain {
        &self.index_codecs
    }

    /// Return the location of the shard index.
    #[must_use]
    pub const fn index_location(&self) -> ShardingIndexLocation {
        self.index_location
    }

    fn layout(&self, shard_representation: &ChunkRepresentation) -> Result<ShardLayout, CodecError> {
        let chunks_per_shard =
            calculate_chunks_per_shard(shard_representation.shape(), &self.chunk_shape)?;
        let index_representation = sharding_index_representation(&chunks_per_shard)?;
        let index_encoded_size =
            compute_index_encoded_size(&self.index_codecs, &index_representation)?;
        let inner_chunk_grid =
            RegularChunkGrid::new(shard_representation.shape_u64(), self.chunk_shape.clone())
                .map_err(|err| CodecError::Other(err.to_string()))?;
        Ok(ShardLayout {
            inner_representation: shard_representation.with_shape(self.chunk_shape.clone()),
            inner_chunk_grid,
            index_representation,
            index_encoded_size,
        })
    }

    fn decode_index(
        &self,
        encoded_index: &[u8],
        layout: &ShardLayout,
        options: &CodecOptions,
    ) -> Result<Vec<u64>, CodecError> {
        let decoded_index = self.index_codecs.decode(
            Cow::Borrowed(encoded_index),
            &layout.index_representation,
            options,
        )?;
        Ok(bytemuck::pod_collect_to_vec(&decoded_index[..]))
    }

    fn encode_index(
        &self,
        shard_index: &[u64],
        layout: &ShardLayout,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let encoded_index = self.index_codecs.encode(
            Cow::Borrowed(bytemuck::cast_slice(shard_index)),
            &layout.index_representation,
            options,
        )?;
        validate_bytes_len(&encoded_index, layout.index_encoded_size)?;
        Ok(encoded_index.into_owned())
    }

    /// Options for inner chunks, which run sequentially if the shard is processed concurrently.
    fn inner_options(options: &CodecOptions) -> CodecOptions {
        if options.concurrent_target() > 1 {
            options.with_concurrent_target(1)
        } else {
            *options
        }
    }
}

impl CodecTraits for ShardingCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> MetadataV3 {
        let configuration = ShardingCodecConfigurationV1 {
            chunk_shape: self.chunk_shape.clone(),
            codecs: self.inner_codecs.create_metadatas(),
            index_codecs: self.index_codecs.create_metadatas(),
            index_location: self.index_location,
        };
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }
}

impl ArrayToBytesCodecTraits for ShardingCodec {
    fn encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let layout = self.layout(decoded_representation)?;
        let inner_chunk_representation = self
            .inner_codecs
            .encoded_representation(&layout.inner_representation)?;
        let num_chunks = layout.inner_chunk_grid.grid_shape().iter().product::<u64>();
        Ok(match inner_chunk_representation.size() {
            Some(size) => {
                BytesRepresentation::BoundedSize(num_chunks * size + layout.index_encoded_size)
            }
            None => BytesRepresentation::UnboundedSize,
        })
    }

    fn encode<'a>(
        &self,
        decoded_value: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        validate_bytes_len(&decoded_value, decoded_representation.size())?;
        let layout = self.layout(decoded_representation)?;
        let shard_shape = decoded_representation.shape_u64();
        let element_size = decoded_representation.element_size();
        let fill_value = decoded_representation.fill_value();
        let inner_options = Self::inner_options(options);

        let encode_inner_chunk = |chunk_indices: &ArrayIndices| -> Result<Option<Bytes>, CodecError> {
            let chunk_subset = layout.inner_chunk_grid.subset(chunk_indices)?;
            let chunk_bytes = chunk_subset.extract_bytes(&decoded_value, &shard_shape, element_size)?;
            if !options.store_empty_chunks() && fill_value.equals_all(&chunk_bytes) {
                return Ok(None);
            }
            let encoded_chunk = ValueHandle::from_array(chunk_bytes).with_encode(
                &self.inner_codecs,
                &layout.inner_representation,
                &inner_options,
            );
            Ok(Some(encoded_chunk.to_bytes()?))
        };

        // Encode the inner chunks in C order
        let chunks: Vec<ArrayIndices> = layout.inner_chunk_grid.iter_chunk_indices().into_iter().collect();
        let encoded_chunks = if options.concurrent_target() > 1 {
            chunks
                .par_iter()
                .map(encode_inner_chunk)
                .collect::<Result<Vec<_>, CodecError>>()?
        } else {
            chunks
                .iter()
                .map(encode_inner_chunk)
                .collect::<Result<Vec<_>, CodecError>>()?
        };

        // Concatenate the inner chunks and record their location in the index
        let index_encoded_size = usize::try_from(layout.index_encoded_size)
            .map_err(|_| CodecError::from("the shard index is too large"))?;
        let chunks_size = encoded_chunks.iter().flatten().map(Bytes::len).sum::<usize>();
        let mut shard_index = vec![u64::MAX; encoded_chunks.len() * 2];
        let mut shard = Vec::with_capacity(chunks_size + index_encoded_size);
        if self.index_location == ShardingIndexLocation::Start {
            shard.resize(index_encoded_size, 0);
        }
        for (entry, encoded_chunk) in std::iter::zip(shard_index.chunks_exact_mut(2), &encoded_chunks) {
            if let Some(encoded_chunk) = encoded_chunk {
                entry[0] = shard.len() as u64;
                entry[1] = encoded_chunk.len() as u64;
                shard.extend_from_slice(encoded_chunk);
            }
        }

        // The index fills the reserved prefix or extends the shard
        let index_range = match self.index_location {
            ShardingIndexLocation::Start => ByteRange::from(0..layout.index_encoded_size),
            ShardingIndexLocation::End => ByteRange::from_start(shard.len() as u64, None),
        };
        let encoded_index = self.encode_index(&shard_index, &layout, options)?;
        let mut shard = ValueHandle::from_bytes(shard);
        shard.set(&index_range, &ValueHandle::from_bytes(encoded_index))?;
        Ok(Cow::Owned(Vec::from(shard.to_bytes()?)))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let layout = self.layout(decoded_representation)?;
        let shard_len = encoded_value.len() as u64;
        let index_range = index_byte_range(self.index_location, layout.index_encoded_size)
            .to_range_usize(shard_len)?;
        let shard_index = self.decode_index(&encoded_value[index_range], &layout, options)?;

        let shard_shape = decoded_representation.shape_u64();
        let element_size = decoded_representation.element_size();
        let inner_options = Self::inner_options(options);

        let decode_inner_chunk = |(chunk_index, chunk_indices): (usize, &ArrayIndices)| -> Result<Option<(ArraySubset, Vec<u8>)>, CodecError> {
            let Some((offset, nbytes)) = index_entry(&shard_index, chunk_index) else {
                log::trace!("inner chunk {chunk_indices:?} is absent from the shard");
                return Ok(None);
            };
            let end = offset
                .checked_add(nbytes)
                .filter(|&end| end <= shard_len)
                .ok_or(CodecError::ShardIndexOutOfBounds)?;
            let byte_range = ByteRange::from(offset..end).to_range_usize(shard_len)?;
            let decoded_chunk = self.inner_codecs.decode(
                Cow::Borrowed(&encoded_value[byte_range]),
                &layout.inner_representation,
                &inner_options,
            )?;
            Ok(Some((
                layout.inner_chunk_grid.subset(chunk_indices)?,
                decoded_chunk.into_owned(),
            )))
        };

        let chunks: Vec<ArrayIndices> = layout.inner_chunk_grid.iter_chunk_indices().into_iter().collect();
        let decoded_chunks = if options.concurrent_target() > 1 {
            chunks
                .par_iter()
                .enumerate()
                .map(decode_inner_chunk)
                .collect::<Result<Vec<_>, CodecError>>()?
        } else {
            chunks
                .iter()
                .enumerate()
                .map(decode_inner_chunk)
                .collect::<Result<Vec<_>, CodecError>>()?
        };

        let mut decoded_shard = decoded_representation.fill_bytes();
        for (chunk_subset, decoded_chunk) in decoded_chunks.into_iter().flatten() {
            chunk_subset.update_bytes(&mut decoded_shard, &shard_shape, &decoded_chunk, element_size)?;
        }
        Ok(Cow::Owned(decoded_shard))
    }

    fn supports_partial_decode(&self) -> bool {
        true
    }

    fn partial_decode(
        &self,
        input_handle: &ValueHandle<'_>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        let shard_shape = decoded_representation.shape_u64();
        if !array_subset.inbounds_shape(&shard_shape) {
            return Err(IndexerError::new_oob(array_subset.clone(), shard_shape).into());
        }
        let layout = self.layout(decoded_representation)?;
        let element_size = decoded_representation.element_size();
        let num_elements = usize::try_from(array_subset.num_elements()).unwrap_or(usize::MAX);
        let mut output = decoded_representation.fill_value().repeat(num_elements);

        // Read and decode the shard index
        let index_range = index_byte_range(self.index_location, layout.index_encoded_size);
        let Some(encoded_index) = input_handle.get(&index_range)?.to_maybe_bytes()? else {
            return Ok(Cow::Owned(output));
        };
        let shard_index = self.decode_index(&encoded_index, &layout, options)?;

        // Read and decode the intersecting inner chunks
        let grid_shape = layout.inner_chunk_grid.grid_shape();
        for work_item in layout.inner_chunk_grid.work_items(array_subset)? {
            let chunk_index = ravel_indices(work_item.chunk_indices(), grid_shape)
                .and_then(|chunk_index| usize::try_from(chunk_index).ok())
                .ok_or(CodecError::ShardIndexOutOfBounds)?;
            let Some((offset, nbytes)) = index_entry(&shard_index, chunk_index) else {
                log::trace!(
                    "inner chunk {:?} is absent from the shard",
                    work_item.chunk_indices()
                );
                continue;
            };
            let chunk_handle = input_handle.get(&ByteRange::from_start(offset, Some(nbytes)))?;
            let decoded_chunk = self.inner_codecs.partial_decode(
                &chunk_handle,
                &layout.inner_representation,
                work_item.chunk_subset(),
                options,
            )?;
            work_item.region_subset().update_bytes(
                &mut output,
                array_subset.shape(),
                &decoded_chunk,
                element_size,
            )?;
        }
        Ok(Cow::Owned(output))
    }
}
