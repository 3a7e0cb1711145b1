use thiserror::Error;

use zarrkit_chunk_grid::{
    ArraySubset, ArraySubsetError, IncompatibleDimensionalityError, IndexerError,
    RegularChunkGridCreateError,
};
use zarrkit_chunk_key_encoding::ChunkKeyEncodingCreateError;
use zarrkit_metadata::{FillValueMetadata, UnsupportedAdditionalFieldError};
use zarrkit_storage::{StorageError, StoreKeyError, StorePrefixError};

use super::{
    codec::CodecError,
    data_type::{IncompatibleFillValueError, UnsupportedDataTypeError},
    ArrayIndices, ArrayShape, DataType,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid array path.
    #[error("invalid array path {0}")]
    InvalidPath(String),
    /// Unsupported additional field.
    #[error(transparent)]
    AdditionalFieldUnsupportedError(#[from] UnsupportedAdditionalFieldError),
    /// Unsupported data type.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnsupportedDataTypeError),
    /// Invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// Invalid fill value metadata.
    #[error("invalid fill value metadata for data type `{data_type_name}`: {fill_value_metadata}")]
    InvalidFillValueMetadata {
        /// The data type name.
        data_type_name: String,
        /// The fill value metadata.
        fill_value_metadata: FillValueMetadata,
    },
    /// Error creating or validating codecs.
    #[error(transparent)]
    CodecsCreateError(#[from] CodecError),
    /// Storage transformers are unsupported.
    #[error("storage transformers are unsupported")]
    StorageTransformersUnsupported,
    /// Chunk grid create error.
    #[error(transparent)]
    ChunkGridCreateError(#[from] RegularChunkGridCreateError),
    /// A chunk shape with a zero dimension.
    #[error("chunk shape {0:?} has a zero dimension")]
    InvalidChunkShape(ArrayShape),
    /// Chunk key encoding create error.
    #[error(transparent)]
    ChunkKeyEncodingCreateError(#[from] ChunkKeyEncodingCreateError),
    /// The number of dimension names does not match the array dimensionality.
    #[error("the number of dimension names {0} does not match array dimensionality {1}")]
    InvalidDimensionNames(usize, usize),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

impl From<StorePrefixError> for ArrayCreateError {
    fn from(err: StorePrefixError) -> Self {
        Self::InvalidPath(err.to_string())
    }
}

/// Array errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices: {0:?}")]
    InvalidChunkGridIndicesError(ArrayIndices),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// Incompatible array subset.
    #[error("array subset {0} is not compatible with array shape {1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// Incompatible chunk subset.
    #[error("chunk subset {0} is not compatible with chunk {1:?} with shape {2:?}")]
    InvalidChunkSubset(ArraySubset, ArrayIndices, ArrayShape),
    /// An unexpected bytes input size.
    #[error("got bytes with size {0:?}, expected {1:?}")]
    InvalidBytesInputSize(usize, u64),
    /// Incompatible element type.
    #[error("the element type {0} does not match the data type {1}")]
    IncompatibleElementType(DataType, DataType),
    /// Invalid element value.
    ///
    /// For example, a bool array with a value not equal to 0 (false) or 1 (true).
    #[error("invalid element value")]
    InvalidElementValue,
    /// The array is not sharded.
    #[error("the array is not sharded")]
    NotSharded,
    /// An invalid chunk key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<IndexerError> for ArrayError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::IncompatibleDimensionality(err) => {
                Self::IncompatibleDimensionalityError(err)
            }
            IndexerError::OutOfBounds(subset, shape) => Self::InvalidArraySubset(subset, shape),
            err => Self::CodecError(err.into()),
        }
    }
}
