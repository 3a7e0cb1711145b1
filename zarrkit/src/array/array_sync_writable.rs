use std::sync::Arc;

use zarrkit_storage::{StorageError, WritableStorageTraits};

use super::{
    Array, ArrayBytes, ArrayCreateError, ArrayError, ArrayMetadataV3, CodecOptions, Element,
    ValueHandle,
};

impl<TStorage: ?Sized + WritableStorageTraits + 'static> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata` and store the metadata.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the metadata is invalid or there is an underlying store error.
    pub fn create(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadataV3,
    ) -> Result<Self, ArrayCreateError> {
        let array = Self::new_with_metadata(storage, path, metadata)?;
        array.store_metadata()?;
        Ok(array)
    }

    /// Store the array metadata as a `zarr.json` document.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let key = self.metadata_key()?;
        let json = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| StorageError::InvalidMetadata(key.clone(), err.to_string()))?;
        self.storage.set(&key, json.into())
    }

    /// Erase the metadata.
    ///
    /// Succeeds if the metadata does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn erase_metadata(&self) -> Result<(), StorageError> {
        self.storage.erase(&self.metadata_key()?)
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), StorageError> {
        self.storage.erase(
            &self
                .chunk_key_encoding
                .chunk_key(&self.path, chunk_indices)?,
        )
    }

    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// `chunk_bytes` hold the elements of the entire chunk in C order and native endianness.
    /// A chunk with only fill value elements is erased instead, unless [`CodecOptions::store_empty_chunks`] is set.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` does not match the chunk size,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk<'a>(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: impl Into<ArrayBytes<'a>>,
    ) -> Result<(), ArrayError> {
        self.store_chunk_opt(chunk_indices, chunk_bytes, &self.codec_options)
    }

    /// Explicit options version of [`store_chunk`](Array::store_chunk).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_chunk_opt<'a>(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: impl Into<ArrayBytes<'a>>,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        let chunk_bytes = chunk_bytes.into();
        let chunk_size = self.chunk_representation.size();
        if chunk_bytes.len() as u64 != chunk_size {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_bytes.len(),
                chunk_size,
            ));
        }

        if !options.store_empty_chunks() && self.fill_value.equals_all(&chunk_bytes) {
            log::trace!("erasing empty chunk {chunk_indices:?}");
            self.erase_chunk(chunk_indices)?;
        } else {
            let chunk_encoded = ValueHandle::from_array(chunk_bytes.into_owned()).with_encode(
                &self.codecs,
                &self.chunk_representation,
                options,
            );
            self.storage
                .set(&self.chunk_key(chunk_indices)?, chunk_encoded.to_bytes()?)?;
        }
        Ok(())
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` does not match the data type or [`store_chunk`](Array::store_chunk) fails.
    pub fn store_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.store_chunk_elements_opt(chunk_indices, chunk_elements, &self.codec_options)
    }

    /// Explicit options version of [`store_chunk_elements`](Array::store_chunk_elements).
    #[allow(clippy::missing_errors_doc)]
    pub fn store_chunk_elements_opt<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        T::validate_data_type(&self.data_type)?;
        self.store_chunk_opt(chunk_indices, T::into_bytes(chunk_elements), options)
    }
}
