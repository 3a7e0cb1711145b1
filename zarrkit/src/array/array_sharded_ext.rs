use zarrkit_storage::ReadableStorageTraits;

#[cfg(feature = "transpose")]
use super::codec::ArrayToArrayCodec;
use super::{
    Array, ArrayBytes, ArrayError, ArrayShape, ChunkShape, CodecOptions, Element, RegularChunkGrid,
};

/// An [`Array`] extension trait to simplify working with arrays using the `sharding_indexed` codec.
pub trait ArrayShardedExt: private::Sealed {
    /// Returns true if the array to bytes codec of the array is `sharding_indexed`.
    fn is_sharded(&self) -> bool;

    /// Returns true if the array-to-bytes codec of the array is `sharding_indexed` and the array has no array-to-array or bytes-to-bytes codecs.
    fn is_exclusively_sharded(&self) -> bool;

    /// Return the inner chunk shape as defined in the `sharding_indexed` codec metadata.
    ///
    /// Returns [`None`] for an unsharded array.
    fn inner_chunk_shape(&self) -> Option<ChunkShape>;

    /// The effective inner chunk shape.
    ///
    /// The effective inner chunk shape is the inner chunk shape in the coordinates of the array.
    /// It differs from [`inner_chunk_shape`](ArrayShardedExt::inner_chunk_shape) if a `transpose` codec precedes the sharding codec.
    ///
    /// Returns [`None`] for an unsharded array.
    fn effective_inner_chunk_shape(&self) -> Option<ChunkShape>;

    /// Retrieve the inner chunk grid.
    ///
    /// Returns the normal chunk grid for an unsharded array.
    fn inner_chunk_grid(&self) -> RegularChunkGrid;

    /// Return the shape of the inner chunk grid (i.e., the number of inner chunks).
    ///
    /// Returns the normal chunk grid shape for an unsharded array.
    fn inner_chunk_grid_shape(&self) -> ArrayShape;
}

impl<TStorage: ?Sized> ArrayShardedExt for Array<TStorage> {
    fn is_sharded(&self) -> bool {
        self.codecs.array_to_bytes_codec().as_sharding().is_some()
    }

    fn is_exclusively_sharded(&self) -> bool {
        self.is_sharded()
            && self.codecs.array_to_array_codecs().is_empty()
            && self.codecs.bytes_to_bytes_codecs().is_empty()
    }

    fn inner_chunk_shape(&self) -> Option<ChunkShape> {
        self.codecs
            .array_to_bytes_codec()
            .as_sharding()
            .map(|sharding| sharding.chunk_shape().to_vec())
    }

    fn effective_inner_chunk_shape(&self) -> Option<ChunkShape> {
        #[allow(unused_mut)]
        let mut inner_chunk_shape = self.inner_chunk_shape()?;
        for codec in self.codecs.array_to_array_codecs().iter().rev() {
            match *codec {
                #[cfg(feature = "transpose")]
                ArrayToArrayCodec::Transpose(ref transpose) => {
                    inner_chunk_shape = transpose
                        .order()
                        .inverse()
                        .0
                        .iter()
                        .map(|&axis| inner_chunk_shape.get(axis).copied())
                        .collect::<Option<_>>()?;
                }
            }
        }
        Some(inner_chunk_shape)
    }

    fn inner_chunk_grid(&self) -> RegularChunkGrid {
        self.effective_inner_chunk_shape()
            .and_then(|inner_chunk_shape| {
                RegularChunkGrid::new(self.shape().to_vec(), inner_chunk_shape).ok()
            })
            .unwrap_or_else(|| self.chunk_grid.clone())
    }

    fn inner_chunk_grid_shape(&self) -> ArrayShape {
        self.inner_chunk_grid().grid_shape().to_vec()
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Read and decode the inner chunk at `inner_chunk_indices` of a sharded array into its bytes.
    ///
    /// Only the shard index and the encoded inner chunk are read from the store if the codecs support partial decoding.
    /// An inner chunk that is absent from its shard, or in an absent shard, is the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is not sharded,
    ///  - `inner_chunk_indices` are not in the inner chunk grid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_inner_chunk(
        &self,
        inner_chunk_indices: &[u64],
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        self.retrieve_inner_chunk_opt(inner_chunk_indices, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_inner_chunk`](Array::retrieve_inner_chunk).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_inner_chunk_opt(
        &self,
        inner_chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        if !self.is_sharded() {
            return Err(ArrayError::NotSharded);
        }
        let inner_chunk_grid = self.inner_chunk_grid();
        if !inner_chunk_grid.chunk_indices_inbounds(inner_chunk_indices) {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                inner_chunk_indices.to_vec(),
            ));
        }

        let inner_chunk_subset = inner_chunk_grid.subset(inner_chunk_indices)?;
        let shard_indices = self.chunk_grid.chunk_indices(inner_chunk_subset.start())?;
        let shard_origin = self.chunk_grid.chunk_origin(&shard_indices)?;
        let shard_subset = inner_chunk_subset.relative_to(&shard_origin)?;
        log::trace!(
            "retrieving inner chunk {inner_chunk_indices:?} from shard {shard_indices:?} subset {shard_subset}"
        );
        self.retrieve_chunk_subset_opt(&shard_indices, &shard_subset, options)
    }

    /// Read and decode the inner chunk at `inner_chunk_indices` of a sharded array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type or [`retrieve_inner_chunk`](Array::retrieve_inner_chunk) fails.
    pub fn retrieve_inner_chunk_elements<T: Element>(
        &self,
        inner_chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_inner_chunk_elements_opt(inner_chunk_indices, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_inner_chunk_elements`](Array::retrieve_inner_chunk_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_inner_chunk_elements_opt<T: Element>(
        &self,
        inner_chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(&self.data_type)?;
        let bytes = self.retrieve_inner_chunk_opt(inner_chunk_indices, options)?;
        T::from_bytes(&bytes)
    }
}

mod private {
    use super::Array;

    pub trait Sealed {}

    impl<TStorage: ?Sized> Sealed for Array<TStorage> {}
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU64, sync::Arc};

    use zarrkit_storage::{
        storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter, store::MemoryStore,
    };

    use super::*;
    use crate::array::{
        codec::{ArrayToBytesCodec, ShardingCodecBuilder},
        ArrayBuilder, ArraySubset, DataType,
    };

    fn sharding_codec(inner_chunk_shape: u64) -> ArrayToBytesCodec {
        ShardingCodecBuilder::new(vec![NonZeroU64::new(inner_chunk_shape).unwrap(); 2])
            .build()
            .into()
    }

    #[test]
    fn array_sharded_ext_unsharded() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![8, 8], DataType::UInt8, vec![4, 4], 0u8)
            .build(store, "/")
            .unwrap();
        assert!(!array.is_sharded());
        assert!(!array.is_exclusively_sharded());
        assert_eq!(array.inner_chunk_shape(), None);
        assert_eq!(array.inner_chunk_grid(), array.chunk_grid().clone());
        assert_eq!(array.inner_chunk_grid_shape(), vec![2, 2]);
        assert!(matches!(
            array.retrieve_inner_chunk(&[0, 0]),
            Err(ArrayError::NotSharded)
        ));
    }

    #[test]
    fn array_sharded_ext_inner_chunks() {
        let store = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
            MemoryStore::new(),
        )));
        let array = ArrayBuilder::new(vec![8, 8], DataType::UInt16, vec![4, 4], 0u16)
            .array_to_bytes_codec(sharding_codec(2))
            .build(store.clone(), "/array")
            .unwrap();
        assert!(array.is_sharded());
        assert!(array.is_exclusively_sharded());
        assert_eq!(
            array.inner_chunk_shape(),
            Some(vec![NonZeroU64::new(2).unwrap(); 2])
        );
        assert_eq!(array.inner_chunk_grid_shape(), vec![4, 4]);

        let elements: Vec<u16> = (0..64).collect();
        array
            .store_array_subset_elements(&array.subset_all(), &elements)
            .unwrap();

        store.reset();
        assert_eq!(
            array.retrieve_inner_chunk_elements::<u16>(&[3, 1]).unwrap(),
            vec![50, 51, 58, 59]
        );
        // The shard index and one inner chunk
        assert_eq!(store.reads(), 2);
        assert_eq!(store.bytes_read(), 4 * 16 + 4 + 8);

        assert!(matches!(
            array.retrieve_inner_chunk(&[4, 0]),
            Err(ArrayError::InvalidChunkGridIndicesError(_))
        ));
        assert!(matches!(
            array.retrieve_inner_chunk_elements::<u8>(&[0, 0]),
            Err(ArrayError::IncompatibleElementType(..))
        ));
    }

    #[test]
    fn array_sharded_ext_inner_chunk_absent() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![4, 4], DataType::Int32, vec![4, 4], 7i32)
            .array_to_bytes_codec(sharding_codec(2))
            .build(store, "/")
            .unwrap();
        assert_eq!(
            array.retrieve_inner_chunk_elements::<i32>(&[1, 1]).unwrap(),
            vec![7; 4]
        );
        array
            .store_chunk_subset_elements::<i32>(
                &[0, 0],
                &ArraySubset::new_with_ranges(&[0..2, 0..2]),
                &[1, 2, 3, 4],
            )
            .unwrap();
        assert_eq!(
            array.retrieve_inner_chunk_elements::<i32>(&[0, 0]).unwrap(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            array.retrieve_inner_chunk_elements::<i32>(&[1, 1]).unwrap(),
            vec![7; 4]
        );
    }

    #[cfg(feature = "transpose")]
    #[test]
    fn array_sharded_ext_effective_inner_chunk_shape() {
        use crate::array::codec::TransposeCodec;
        use zarrkit_metadata::codec::transpose::TransposeOrder;

        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![8, 4], DataType::UInt8, vec![8, 4], 0u8)
            .array_to_array_codecs(vec![
                TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap()).into(),
            ])
            .array_to_bytes_codec(
                ShardingCodecBuilder::new(vec![
                    NonZeroU64::new(1).unwrap(),
                    NonZeroU64::new(4).unwrap(),
                ])
                .build()
                .into(),
            )
            .build(store, "/")
            .unwrap();
        assert!(!array.is_exclusively_sharded());
        assert_eq!(
            array.effective_inner_chunk_shape(),
            Some(vec![NonZeroU64::new(4).unwrap(), NonZeroU64::new(1).unwrap()])
        );
        assert_eq!(array.inner_chunk_grid_shape(), vec![2, 4]);

        let elements: Vec<u8> = (0..32).collect();
        array
            .store_array_subset_elements(&array.subset_all(), &elements)
            .unwrap();
        assert_eq!(
            array.retrieve_inner_chunk_elements::<u8>(&[1, 2]).unwrap(),
            vec![18, 22, 26, 30]
        );
    }
}
