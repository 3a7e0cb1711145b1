use zarrkit_storage::{ListableStorageTraits, StorageError};

use super::{Array, ArrayIndices, ZARR_JSON};

impl<TStorage: ?Sized + ListableStorageTraits + 'static> Array<TStorage> {
    /// Return the indices of the chunks of the array that exist in the store, in lexicographical order.
    ///
    /// Keys under the array prefix that do not decode to chunk indices in the chunk grid are ignored.
    /// This includes the chunks of a nested array and chunks outside the current array shape.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    pub fn stored_chunks(&self) -> Result<Vec<ArrayIndices>, StorageError> {
        let prefix = self.path.as_str();
        let mut chunks: Vec<ArrayIndices> = self
            .storage
            .list_prefix(&self.path)?
            .iter()
            .filter_map(|key| key.as_str().strip_prefix(prefix))
            .filter(|name| *name != ZARR_JSON)
            .filter_map(|name| self.chunk_key_encoding.decode(name, self.dimensionality()))
            .filter(|chunk_indices| self.chunk_grid.chunk_indices_inbounds(chunk_indices))
            .collect();
        chunks.sort_unstable();
        Ok(chunks)
    }
}
