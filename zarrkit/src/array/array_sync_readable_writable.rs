use zarrkit_storage::ReadableWritableStorageTraits;

use super::{Array, ArrayBytes, ArrayError, ArraySubset, CodecOptions, Element};

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> Array<TStorage> {
    /// Encode `chunk_subset_bytes` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// `chunk_subset` is relative to the origin of the chunk.
    /// Unless `chunk_subset` spans the whole chunk, the existing chunk is retrieved (or filled with the fill value if absent), updated, and stored again.
    /// This read-modify-write is not atomic.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is out of bounds of the chunk,
    ///  - the length of `chunk_subset_bytes` does not match the size of `chunk_subset`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_chunk_subset<'a>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: impl Into<ArrayBytes<'a>>,
    ) -> Result<(), ArrayError> {
        self.store_chunk_subset_opt(
            chunk_indices,
            chunk_subset,
            chunk_subset_bytes,
            &self.codec_options,
        )
    }

    /// Explicit options version of [`store_chunk_subset`](Array::store_chunk_subset).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_chunk_subset_opt<'a>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: impl Into<ArrayBytes<'a>>,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        let chunk_subset_bytes = chunk_subset_bytes.into();
        let expected_size = chunk_subset.num_elements() * self.data_type.size() as u64;
        if chunk_subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_subset_bytes.len(),
                expected_size,
            ));
        }

        let chunk_shape = self.chunk_representation.shape_u64();
        if chunk_subset.shape() == chunk_shape && chunk_subset.start().iter().all(|&x| x == 0) {
            // The subset spans the whole chunk, so store the bytes directly and skip decoding
            self.store_chunk_opt(chunk_indices, chunk_subset_bytes, options)
        } else {
            // Decode the entire chunk
            let mut chunk_bytes = self
                .retrieve_chunk_opt(chunk_indices, options)?
                .into_owned();

            // Update the chunk
            chunk_subset.update_bytes(
                &mut chunk_bytes,
                &chunk_shape,
                &chunk_subset_bytes,
                self.data_type.size(),
            )?;

            // Store the updated chunk
            self.store_chunk_opt(chunk_indices, chunk_bytes, options)
        }
    }

    /// Encode `chunk_subset_elements` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type or [`store_chunk_subset`](Array::store_chunk_subset) fails.
    pub fn store_chunk_subset_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        T::validate_data_type(&self.data_type)?;
        self.store_chunk_subset_opt(
            chunk_indices,
            chunk_subset,
            T::into_bytes(chunk_subset_elements),
            &self.codec_options,
        )
    }

    /// Encode `subset_bytes` and store in `array_subset`.
    ///
    /// `subset_bytes` hold the elements of `array_subset` in C order and native endianness.
    /// The region is decomposed into one work item per intersecting chunk.
    /// A chunk covered entirely by the region is encoded directly.
    /// Other chunks are updated with a read-modify-write.
    ///
    /// Chunks are stored one at a time: if an error occurs, chunks stored before it remain in the store.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the `array_subset` dimensionality does not match the array dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - the length of `subset_bytes` does not match the size of `array_subset`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_array_subset<'a>(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: impl Into<ArrayBytes<'a>>,
    ) -> Result<(), ArrayError> {
        self.store_array_subset_opt(array_subset, subset_bytes, &self.codec_options)
    }

    /// Explicit options version of [`store_array_subset`](Array::store_array_subset).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_array_subset_opt<'a>(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: impl Into<ArrayBytes<'a>>,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        let work_items = self.chunk_grid.work_items(array_subset)?;
        let subset_bytes = subset_bytes.into();
        let element_size = self.data_type.size();
        let expected_size = array_subset.num_elements() * element_size as u64;
        if subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                subset_bytes.len(),
                expected_size,
            ));
        }

        let chunk_shape = self.chunk_representation.shape_u64();
        for work_item in &work_items {
            log::trace!("store {work_item}");
            let chunk_subset_bytes = work_item.region_subset().extract_bytes(
                &subset_bytes,
                array_subset.shape(),
                element_size,
            )?;
            if work_item.is_full_chunk() {
                // Every element of the chunk within the array is overwritten, so skip reading
                let chunk_bytes = if work_item.chunk_subset().shape() == chunk_shape {
                    chunk_subset_bytes
                } else {
                    let mut chunk_bytes = self.chunk_representation.fill_bytes();
                    work_item.chunk_subset().update_bytes(
                        &mut chunk_bytes,
                        &chunk_shape,
                        &chunk_subset_bytes,
                        element_size,
                    )?;
                    chunk_bytes
                };
                self.store_chunk_opt(work_item.chunk_indices(), chunk_bytes, options)?;
            } else {
                self.store_chunk_subset_opt(
                    work_item.chunk_indices(),
                    work_item.chunk_subset(),
                    chunk_subset_bytes,
                    options,
                )?;
            }
        }
        Ok(())
    }

    /// Encode `subset_elements` and store in `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type or [`store_array_subset`](Array::store_array_subset) fails.
    pub fn store_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.store_array_subset_elements_opt(array_subset, subset_elements, &self.codec_options)
    }

    /// Explicit options version of [`store_array_subset_elements`](Array::store_array_subset_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_array_subset_elements_opt<T: Element>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        T::validate_data_type(&self.data_type)?;
        self.store_array_subset_opt(array_subset, T::into_bytes(subset_elements), options)
    }

    #[cfg(feature = "ndarray")]
    /// Encode `subset_array` and store in the array subset starting at `subset_start`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - `subset_start` does not match the array dimensionality, or
    ///  - [`store_array_subset`](Array::store_array_subset) fails.
    pub fn store_array_subset_ndarray<T: Element, S, D>(
        &self,
        subset_start: &[u64],
        subset_array: &ndarray::ArrayBase<S, D>,
    ) -> Result<(), ArrayError>
    where
        S: ndarray::Data<Elem = T>,
        D: ndarray::Dimension,
    {
        self.store_array_subset_ndarray_opt(subset_start, subset_array, &self.codec_options)
    }

    #[cfg(feature = "ndarray")]
    /// Explicit options version of [`store_array_subset_ndarray`](Array::store_array_subset_ndarray).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_array_subset_ndarray_opt<T: Element, S, D>(
        &self,
        subset_start: &[u64],
        subset_array: &ndarray::ArrayBase<S, D>,
        options: &CodecOptions,
    ) -> Result<(), ArrayError>
    where
        S: ndarray::Data<Elem = T>,
        D: ndarray::Dimension,
    {
        let subset = ArraySubset::new_with_start_shape(
            subset_start.to_vec(),
            subset_array.shape().iter().map(|&s| s as u64).collect(),
        )?;
        let elements: Vec<T> = subset_array.iter().copied().collect();
        self.store_array_subset_elements_opt(&subset, &elements, options)
    }

    /// Encode `elements` and store them as the entire array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type or [`store_array_subset`](Array::store_array_subset) fails.
    pub fn store_array_elements<T: Element>(&self, elements: &[T]) -> Result<(), ArrayError> {
        self.store_array_subset_elements_opt(&self.subset_all(), elements, &self.codec_options)
    }
}
