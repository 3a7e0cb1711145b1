use std::{num::NonZeroU64, sync::Arc};

use zarrkit_chunk_key_encoding::DefaultChunkKeyEncoding;

use super::{
    codec::{ArrayToArrayCodec, ArrayToBytesCodec, BytesCodec, BytesToBytesCodec},
    Array, ArrayCreateError, ArrayMetadataV3, ArrayShape, ChunkKeyEncoding, CodecChain, DataType,
    DimensionName, FillValue, RegularChunkGrid,
};

/// An [`Array`] builder.
///
/// [`ArrayBuilder`] is initialised from an array shape, data type, regular chunk shape, and fill value.
///  - The default array-to-bytes codec is [`bytes`](crate::array::codec::BytesCodec) with native endian encoding.
///  - Array-to-array and bytes-to-bytes codecs are empty by default.
///  - The default chunk key encoding is `default` with the `/` chunk key separator.
///  - Attributes and dimension names are empty.
///
/// Use the methods in the array builder to change the configuration away from these defaults, and then build the array at a path of some storage with [`ArrayBuilder::build`].
///
/// [`build`](ArrayBuilder::build) does not modify the store! Array metadata has to be explicitly written with [`Array::store_metadata`].
///
/// ### Example
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::{num::NonZeroU64, sync::Arc};
/// use zarrkit::array::{codec::ShardingCodecBuilder, ArrayBuilder, DataType};
/// # let store = Arc::new(zarrkit::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Float32, // data type
///     vec![4, 4], // regular chunk (shard) shape
///     f32::NAN, // fill value
/// )
/// .array_to_bytes_codec(
///     ShardingCodecBuilder::new(vec![NonZeroU64::try_from(2)?; 2])
///         .build()
///         .into(),
/// )
/// .dimension_names(Some(vec![Some("y".to_string()), Some("x".to_string())]))
/// .build(store.clone(), "/group/array")?;
/// array.store_metadata()?; // write metadata to the store
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: ArrayShape,
    fill_value: FillValue,
    chunk_key_encoding: ChunkKeyEncoding,
    array_to_array_codecs: Vec<ArrayToArrayCodec>,
    array_to_bytes_codec: ArrayToBytesCodec,
    bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    attributes: serde_json::Map<String, serde_json::Value>,
    dimension_names: Option<Vec<DimensionName>>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    ///
    /// The length of `chunk_shape` must match the dimensionality of the array and every chunk dimension must be nonzero.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ArrayShape,
        fill_value: impl Into<FillValue>,
    ) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            fill_value: fill_value.into(),
            chunk_key_encoding: DefaultChunkKeyEncoding::default().into(),
            array_to_array_codecs: Vec::default(),
            array_to_bytes_codec: BytesCodec::default().into(),
            bytes_to_bytes_codecs: Vec::default(),
            attributes: serde_json::Map::default(),
            dimension_names: None,
        }
    }

    /// Set the chunk key encoding.
    ///
    /// If left unmodified, the array will use `default` chunk key encoding with the `/` chunk key separator.
    pub fn chunk_key_encoding(
        &mut self,
        chunk_key_encoding: impl Into<ChunkKeyEncoding>,
    ) -> &mut Self {
        self.chunk_key_encoding = chunk_key_encoding.into();
        self
    }

    /// Set the array to array codecs.
    ///
    /// If left unmodified, the array will have no array to array codecs.
    pub fn array_to_array_codecs(
        &mut self,
        array_to_array_codecs: Vec<ArrayToArrayCodec>,
    ) -> &mut Self {
        self.array_to_array_codecs = array_to_array_codecs;
        self
    }

    /// Set the array to bytes codec.
    ///
    /// If left unmodified, the array will default to using the `bytes` codec with native endian encoding.
    pub fn array_to_bytes_codec(&mut self, array_to_bytes_codec: ArrayToBytesCodec) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    ///
    /// If left unmodified, the array will have no bytes to bytes codecs (i.e. it will be uncompressed).
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the user defined attributes.
    ///
    /// If left unmodified, the user defined attributes of the array will be empty.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Set the dimension names.
    ///
    /// If left unmodified, all dimension names are "unnamed".
    pub fn dimension_names(&mut self, dimension_names: Option<Vec<DimensionName>>) -> &mut Self {
        self.dimension_names = dimension_names;
        self
    }

    /// Build into [`ArrayMetadataV3`].
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the chunk shape has a zero dimension or a different dimensionality to the array shape, or the fill value is incompatible with the data type.
    pub fn build_metadata(&self) -> Result<ArrayMetadataV3, ArrayCreateError> {
        let chunk_shape = self
            .chunk_shape
            .iter()
            .map(|&size| NonZeroU64::new(size))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ArrayCreateError::InvalidChunkShape(self.chunk_shape.clone()))?;
        let chunk_grid = RegularChunkGrid::new(self.shape.clone(), chunk_shape)?;
        let fill_value = self.data_type.metadata_fill_value(&self.fill_value)?;
        let codecs = CodecChain::new(
            self.array_to_array_codecs.clone(),
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );

        Ok(ArrayMetadataV3::new(
            self.shape.clone(),
            self.data_type.metadata(),
            chunk_grid.create_metadata(),
            self.chunk_key_encoding.create_metadata(),
            fill_value,
            codecs.create_metadatas(),
        )
        .with_attributes(self.attributes.clone())
        .with_dimension_names(self.dimension_names.clone()))
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    /// This can be due to a storage error, an invalid path, or a problem with array configuration.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        Array::new_with_metadata(storage, path, self.build_metadata()?)
    }
}
