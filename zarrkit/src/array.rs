//! Zarr arrays.
//!
//! An array is a node in a Zarr hierarchy used to hold multidimensional array data and associated metadata.
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/index.html#array>.
//!
//! An [`Array`] is created with [`Array::new_with_metadata`], [`Array::open`], [`Array::create`], or an [`ArrayBuilder`].
//! Construction validates the metadata eagerly: the data type, fill value, chunk grid, chunk key encoding, and every codec of the codec chain must be supported and mutually compatible before any chunk is read or written.
//!
//! Array operations are divided into several categories based on the traits implemented for the backing [storage](crate::storage):
//!  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits): read array data and metadata
//!    - [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists)
//!    - [`retrieve_chunk`](Array::retrieve_chunk)
//!    - [`retrieve_chunk_subset`](Array::retrieve_chunk_subset)
//!    - [`retrieve_encoded_chunk`](Array::retrieve_encoded_chunk)
//!    - [`retrieve_array_subset`](Array::retrieve_array_subset)
//!    - [`retrieve_array_subset_elements`](Array::retrieve_array_subset_elements)
//!    - [`retrieve_array_subset_ndarray`](Array::retrieve_array_subset_ndarray) (`ndarray` feature)
//!    - [`retrieve_inner_chunk`](Array::retrieve_inner_chunk) (sharded arrays)
//!  - [`WritableStorageTraits`](crate::storage::WritableStorageTraits): store/erase array data and metadata
//!    - [`store_metadata`](Array::store_metadata)
//!    - [`erase_metadata`](Array::erase_metadata)
//!    - [`store_chunk`](Array::store_chunk)
//!    - [`erase_chunk`](Array::erase_chunk)
//!  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits): store operations requiring reading
//!    - [`store_chunk_subset`](Array::store_chunk_subset)
//!    - [`store_array_subset`](Array::store_array_subset)
//!    - [`store_array_subset_elements`](Array::store_array_subset_elements)
//!    - [`store_array_subset_ndarray`](Array::store_array_subset_ndarray) (`ndarray` feature)
//!  - [`ListableStorageTraits`](crate::storage::ListableStorageTraits): discover stored chunks
//!    - [`stored_chunks`](Array::stored_chunks)
//!
//! Each retrieve and store method has an `_opt` variant taking [`CodecOptions`].
//! Otherwise the codec options of the array are used, see [`Array::set_codec_options`].
//!
//! A chunk that is absent from the store reads as the fill value.
//! Multi-chunk writes are not atomic: an error part way through leaves previously written chunks in the store.

mod array_builder;
mod array_bytes;
mod array_errors;
mod array_representation;
mod array_sharded_ext;
mod array_sync_listable;
mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;
mod bytes_representation;
pub mod codec;
pub mod data_type;
mod element;
mod fill_value;
mod value_handle;

use std::sync::Arc;

pub use zarrkit_chunk_grid::{
    ArrayIndices, ArrayShape, ArraySubset, ChunkShape, ChunkWorkItem, RegularChunkGrid,
};
pub use zarrkit_chunk_key_encoding::ChunkKeyEncoding;
pub use zarrkit_metadata::{ArrayMetadataV3, DimensionName, FillValueMetadata};

pub use self::{
    array_builder::ArrayBuilder,
    array_bytes::{ArrayBytes, RawBytes},
    array_errors::{ArrayCreateError, ArrayError},
    array_representation::ChunkRepresentation,
    array_sharded_ext::ArrayShardedExt,
    bytes_representation::BytesRepresentation,
    codec::{CodecChain, CodecOptions},
    data_type::DataType,
    element::Element,
    fill_value::FillValue,
    value_handle::ValueHandle,
};

use zarrkit_storage::{StoreKey, StoreKeyError, StorePrefix};

/// The name of the array metadata document.
const ZARR_JSON: &str = "zarr.json";

/// A Zarr array.
///
/// See the [module documentation](self).
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The prefix of the array in the storage.
    path: StorePrefix,
    /// The data type of the array.
    data_type: DataType,
    /// The chunk grid of the array.
    chunk_grid: RegularChunkGrid,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    chunk_key_encoding: ChunkKeyEncoding,
    /// Provides an element value to use for uninitialised portions of the Zarr array.
    fill_value: FillValue,
    /// Specifies a list of codecs to be used for encoding and decoding chunks.
    codecs: CodecChain,
    /// The decoded representation of every chunk.
    chunk_representation: ChunkRepresentation,
    /// The array metadata.
    metadata: ArrayMetadataV3,
    /// The default codec options of array operations.
    codec_options: CodecOptions,
}

/// Convert an array path to the prefix of its keys in a store.
///
/// `"/"` (or `""`) is the root of the store, and `"/group/array"` is the prefix `group/array/`.
fn path_to_prefix(path: &str) -> Result<StorePrefix, ArrayCreateError> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        Ok(StorePrefix::root())
    } else if path.ends_with('/') {
        Err(ArrayCreateError::InvalidPath(path.to_string()))
    } else {
        Ok(StorePrefix::new(format!("{path}/"))?)
    }
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    /// This does **not** write to the store, use [`store_metadata`](Array::store_metadata) to write `metadata` to `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - the path is invalid,
    ///  - the metadata has an unsupported data type, chunk grid, chunk key encoding, codec, or additional field,
    ///  - the fill value is incompatible with the data type,
    ///  - the codecs do not support the chunk representation, or
    ///  - the dimension names do not match the array dimensionality.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadataV3,
    ) -> Result<Self, ArrayCreateError> {
        let path = path_to_prefix(path)?;

        metadata.validate_additional_fields()?;
        if !metadata.storage_transformers.is_empty() {
            return Err(ArrayCreateError::StorageTransformersUnsupported);
        }

        let data_type = DataType::from_metadata(&metadata.data_type)?;

        let chunk_grid = RegularChunkGrid::from_metadata(&metadata.chunk_grid, metadata.shape.clone())?;

        let fill_value = data_type
            .fill_value_from_metadata(&metadata.fill_value)
            .map_err(|_| ArrayCreateError::InvalidFillValueMetadata {
                data_type_name: data_type.to_string(),
                fill_value_metadata: metadata.fill_value.clone(),
            })?;

        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata.chunk_key_encoding)?;

        if let Some(dimension_names) = &metadata.dimension_names {
            if dimension_names.len() != metadata.shape.len() {
                return Err(ArrayCreateError::InvalidDimensionNames(
                    dimension_names.len(),
                    metadata.shape.len(),
                ));
            }
        }

        let codecs = CodecChain::from_metadata(&metadata.codecs)?;
        let chunk_representation = ChunkRepresentation::new(
            chunk_grid.chunk_shape().to_vec(),
            data_type,
            fill_value.clone(),
        )?;
        codecs.validate(&chunk_representation)?;

        Ok(Self {
            storage,
            path,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            chunk_representation,
            metadata,
            codec_options: CodecOptions::default(),
        })
    }

    /// Get the underlying storage backing the array.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Get the store prefix of the array.
    #[must_use]
    pub const fn path(&self) -> &StorePrefix {
        &self.path
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.chunk_grid.array_shape()
    }

    /// Get the array dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape().len()
    }

    /// Get the codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the dimension names.
    #[must_use]
    pub fn dimension_names(&self) -> Option<&[DimensionName]> {
        self.metadata.dimension_names.as_deref()
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata.attributes
    }

    /// Get the array metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadataV3 {
        &self.metadata
    }

    /// Get the default codec options.
    #[must_use]
    pub const fn codec_options(&self) -> &CodecOptions {
        &self.codec_options
    }

    /// Set the default codec options used by operations without an `_opt` suffix.
    pub fn set_codec_options(&mut self, codec_options: CodecOptions) -> &mut Self {
        self.codec_options = codec_options;
        self
    }

    /// Set the default codec options used by operations without an `_opt` suffix.
    #[must_use]
    pub fn with_codec_options(mut self, codec_options: CodecOptions) -> Self {
        self.codec_options = codec_options;
        self
    }

    /// Get the decoded representation of every chunk.
    ///
    /// Chunks on the upper boundary of the array have the full chunk shape, elements outside the array hold the fill value.
    #[must_use]
    pub const fn chunk_representation(&self) -> &ChunkRepresentation {
        &self.chunk_representation
    }

    /// Return the store key of the array metadata document.
    fn metadata_key(&self) -> Result<StoreKey, StoreKeyError> {
        StoreKey::new_with_prefix(&self.path, ZARR_JSON)
    }

    /// Return the store key of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidStoreKey`] if the chunk key encoding produces an invalid key.
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> Result<StoreKey, ArrayError> {
        Ok(self.chunk_key_encoding.chunk_key(&self.path, chunk_indices)?)
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices` are not in the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        Ok(self.chunk_grid.subset(chunk_indices)?)
    }

    /// Return the array subset of the chunk at `chunk_indices` bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices` are not in the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        Ok(self.chunk_grid.subset_bounded(chunk_indices)?)
    }

    /// Return an array subset that spans the entire array.
    #[must_use]
    pub fn subset_all(&self) -> ArraySubset {
        ArraySubset::new_with_shape(self.shape().to_vec())
    }

    fn validate_chunk_indices(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        if self.chunk_grid.chunk_indices_inbounds(chunk_indices) {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ))
        }
    }

    fn validate_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<(), ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        let chunk_shape = self.chunk_representation.shape_u64();
        if chunk_subset.inbounds_shape(&chunk_shape) {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                chunk_shape,
            ))
        }
    }
}
