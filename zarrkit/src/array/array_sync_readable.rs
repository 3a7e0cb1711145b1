use std::sync::Arc;

use zarrkit_storage::{Bytes, ReadableStorage, ReadableStorageTraits, StorageError, StorageHandle};

use super::{
    Array, ArrayBytes, ArrayCreateError, ArrayError, ArrayMetadataV3, ArraySubset, CodecOptions,
    Element, ValueHandle, ZARR_JSON,
};

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Open an existing array in `storage` at `path`.
    /// The metadata is read from the `zarr.json` document in the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata is missing, or any metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let prefix = super::path_to_prefix(path)?;
        let key = zarrkit_storage::StoreKey::new_with_prefix(&prefix, ZARR_JSON)
            .map_err(StorageError::from)?;
        let Some(metadata) = storage.get(&key)? else {
            return Err(ArrayCreateError::MissingMetadata);
        };
        let metadata: ArrayMetadataV3 = serde_json::from_slice(&metadata)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;
        Self::new_with_metadata(storage, path, metadata)
    }

    /// A type-erased handle to the storage of the array.
    fn readable_storage(&self) -> ReadableStorage {
        Arc::new(StorageHandle::new(self.storage.clone()))
    }

    /// A lazy handle to the encoded chunk at `chunk_indices`.
    pub(super) fn chunk_handle(&self, chunk_indices: &[u64]) -> Result<ValueHandle<'static>, ArrayError> {
        Ok(ValueHandle::new_stored(
            self.readable_storage(),
            self.chunk_key(chunk_indices)?,
        ))
    }

    /// Read the encoded chunk at `chunk_indices`, or [`None`] if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are invalid or there is an underlying store error.
    pub fn retrieve_encoded_chunk(&self, chunk_indices: &[u64]) -> Result<Option<Bytes>, ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        Ok(self.chunk_handle(chunk_indices)?.to_maybe_bytes()?)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists with default codec options.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<ArrayBytes<'static>>, ArrayError> {
        self.retrieve_chunk_if_exists_opt(chunk_indices, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_chunk_if_exists_opt(
        &self,
        chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<Option<ArrayBytes<'static>>, ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        let handle = self.chunk_handle(chunk_indices)?.with_decode(
            &self.codecs,
            &self.chunk_representation,
            options,
        );
        Ok(handle.to_maybe_array(&self.chunk_representation)?)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes.
    ///
    /// A chunk that does not exist is filled with the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<ArrayBytes<'static>, ArrayError> {
        self.retrieve_chunk_opt(chunk_indices, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_chunk`](Array::retrieve_chunk).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_chunk_opt(
        &self,
        chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        Ok(self
            .retrieve_chunk_if_exists_opt(chunk_indices, options)?
            .unwrap_or_else(|| self.chunk_representation.fill_bytes().into()))
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_chunk_elements_opt(chunk_indices, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_chunk_elements`](Array::retrieve_chunk_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_chunk_elements_opt<T: Element>(
        &self,
        chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(&self.data_type)?;
        T::from_bytes(&self.retrieve_chunk_opt(chunk_indices, options)?)
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into its bytes.
    ///
    /// `chunk_subset` is relative to the origin of the chunk.
    /// If the codecs support partial decoding, only the parts of the chunk holding `chunk_subset` are read.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is out of bounds of the chunk,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        self.retrieve_chunk_subset_opt(chunk_indices, chunk_subset, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_chunk_subset`](Array::retrieve_chunk_subset).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_chunk_subset_opt(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        self.retrieve_chunk_subset_unchecked(chunk_indices, chunk_subset, options)
    }

    fn retrieve_chunk_subset_unchecked(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        if chunk_subset.start().iter().all(|&start| start == 0)
            && chunk_subset.shape() == self.chunk_representation.shape_u64()
        {
            return self.retrieve_chunk_opt(chunk_indices, options);
        }
        let handle = self.chunk_handle(chunk_indices)?;
        Ok(self.codecs.partial_decode(
            &handle,
            &self.chunk_representation,
            chunk_subset,
            options,
        )?)
    }

    /// Read and decode the `array_subset` of the array into its bytes.
    ///
    /// The output holds the elements of `array_subset` in C order.
    /// Elements in chunks that do not exist hold the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the `array_subset` dimensionality does not match the array dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        self.retrieve_array_subset_opt(array_subset, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_array_subset`](Array::retrieve_array_subset).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_array_subset_opt(
        &self,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        let work_items = self.chunk_grid.work_items(array_subset)?;
        let element_size = self.data_type.size();
        let num_elements = usize::try_from(array_subset.num_elements())
            .map_err(|_| ArrayError::Other("array subset is too large".to_string()))?;

        // Shortcut for a subset that is exactly one chunk
        if let [work_item] = work_items.as_slice() {
            if work_item.chunk_subset().shape() == self.chunk_representation.shape_u64() {
                return self.retrieve_chunk_opt(work_item.chunk_indices(), options);
            }
        }

        let mut output = self.fill_value.repeat(num_elements);
        for work_item in &work_items {
            log::trace!("retrieve {work_item}");
            let chunk_subset_bytes = self.retrieve_chunk_subset_unchecked(
                work_item.chunk_indices(),
                work_item.chunk_subset(),
                options,
            )?;
            work_item.region_subset().update_bytes(
                &mut output,
                array_subset.shape(),
                &chunk_subset_bytes,
                element_size,
            )?;
        }
        Ok(output.into())
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - the `array_subset` dimensionality does not match the array dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_array_subset_elements_opt(array_subset, &self.codec_options)
    }

    /// Explicit options version of [`retrieve_array_subset_elements`](Array::retrieve_array_subset_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_array_subset_elements_opt<T: Element>(
        &self,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(&self.data_type)?;
        T::from_bytes(&self.retrieve_array_subset_opt(array_subset, options)?)
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the `array_subset` of the array into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - the `array_subset` dimensionality does not match the array dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset_ndarray<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        self.retrieve_array_subset_ndarray_opt(array_subset, &self.codec_options)
    }

    #[cfg(feature = "ndarray")]
    /// Explicit options version of [`retrieve_array_subset_ndarray`](Array::retrieve_array_subset_ndarray).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_array_subset_ndarray_opt<T: Element>(
        &self,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_array_subset_elements_opt(array_subset, options)?;
        super::array_bytes::elements_to_ndarray(array_subset.shape(), elements)
    }

    /// Read and decode the entire array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type, there is a codec decoding error, or an underlying store error.
    pub fn retrieve_array_elements<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        self.retrieve_array_elements_opt(&self.codec_options)
    }

    /// Explicit options version of [`retrieve_array_elements`](Array::retrieve_array_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_array_elements_opt<T: Element>(
        &self,
        options: &CodecOptions,
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_array_subset_elements_opt(&self.subset_all(), options)
    }
}

#[cfg(test)]
mod tests {
    use zarrkit_storage::{
        storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter,
        store::MemoryStore, WritableStorageTraits,
    };

    use super::*;
    use crate::array::{ArrayBuilder, DataType, FillValue};

    fn array_u8(store: Arc<MemoryStore>) -> Array<MemoryStore> {
        ArrayBuilder::new(vec![4, 4], DataType::UInt8, vec![2, 2], FillValue::from(9u8))
            .build(store, "/array")
            .unwrap()
    }

    #[test]
    fn array_open_missing_metadata() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Array::open(store, "/array"),
            Err(ArrayCreateError::MissingMetadata)
        ));
    }

    #[test]
    fn array_open_invalid_metadata() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                &zarrkit_storage::StoreKey::new("array/zarr.json").unwrap(),
                Bytes::from_static(b"{\"zarr_format\": 2}"),
            )
            .unwrap();
        assert!(matches!(
            Array::open(store, "/array"),
            Err(ArrayCreateError::StorageError(StorageError::InvalidMetadata(..)))
        ));
    }

    #[test]
    fn array_retrieve_absent() {
        let store = Arc::new(MemoryStore::new());
        let array = array_u8(store);
        assert!(array.retrieve_chunk_if_exists(&[0, 0]).unwrap().is_none());
        assert!(array.retrieve_encoded_chunk(&[0, 0]).unwrap().is_none());
        assert_eq!(array.retrieve_chunk(&[1, 1]).unwrap().as_ref(), &[9u8; 4]);
        assert_eq!(array.retrieve_array_elements::<u8>().unwrap(), vec![9u8; 16]);
        assert_eq!(
            array
                .retrieve_chunk_subset(&[0, 1], &ArraySubset::new_with_ranges(&[1..2, 0..2]))
                .unwrap()
                .as_ref(),
            &[9u8; 2]
        );
    }

    #[test]
    fn array_retrieve_invalid() {
        let store = Arc::new(MemoryStore::new());
        let array = array_u8(store);
        assert!(matches!(
            array.retrieve_chunk(&[2, 0]),
            Err(ArrayError::InvalidChunkGridIndicesError(_))
        ));
        assert!(matches!(
            array.retrieve_chunk_subset(&[0, 0], &ArraySubset::new_with_ranges(&[0..3, 0..1])),
            Err(ArrayError::InvalidChunkSubset(..))
        ));
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..5, 0..1])),
            Err(ArrayError::InvalidArraySubset(..))
        ));
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..1])),
            Err(ArrayError::IncompatibleDimensionalityError(_))
        ));
        assert!(matches!(
            array.retrieve_array_elements::<u16>(),
            Err(ArrayError::IncompatibleElementType(DataType::UInt16, DataType::UInt8))
        ));
    }

    #[test]
    fn array_retrieve_chunk_subset_reads_partially() {
        let store = Arc::new(MemoryStore::new());
        let array = array_u8(store.clone());
        array.store_metadata().unwrap();
        array
            .store_array_elements::<u8>(&(0..16).collect::<Vec<_>>())
            .unwrap();

        let metrics = Arc::new(PerformanceMetricsStorageAdapter::new(store));
        let array = Array::open(metrics.clone(), "/array").unwrap();
        metrics.reset();
        assert_eq!(
            array
                .retrieve_chunk_subset(&[1, 0], &ArraySubset::new_with_ranges(&[1..2, 0..2]))
                .unwrap()
                .as_ref(),
            &[12, 13]
        );
        assert_eq!(metrics.bytes_read(), 2);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn array_retrieve_ndarray() {
        let store = Arc::new(MemoryStore::new());
        let array = array_u8(store);
        array
            .store_array_elements::<u8>(&(0..16).collect::<Vec<_>>())
            .unwrap();
        let subset = array
            .retrieve_array_subset_ndarray::<u8>(&ArraySubset::new_with_ranges(&[1..3, 1..4]))
            .unwrap();
        assert_eq!(subset.shape(), &[2, 3]);
        assert_eq!(subset, ndarray::array![[5u8, 6, 7], [9, 10, 11]].into_dyn());
    }
}
