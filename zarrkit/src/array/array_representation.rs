use std::num::NonZeroU64;

use derive_more::Display;

use zarrkit_chunk_grid::ChunkShapeTraits;

use super::{data_type::IncompatibleFillValueError, ArrayShape, ChunkShape, DataType, FillValue};

/// The shape, data type, and fill value of a chunk.
///
/// This is the decoded representation of a chunk passed to and returned from codecs.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ChunkRepresentation {
    shape: ChunkShape,
    data_type: DataType,
    fill_value: FillValue,
}

impl ChunkRepresentation {
    /// Create a new [`ChunkRepresentation`].
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the `data_type` and `fill_value` are incompatible.
    pub fn new(
        shape: ChunkShape,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        if data_type.size() == fill_value.size() {
            Ok(Self {
                shape,
                data_type,
                fill_value,
            })
        } else {
            Err(IncompatibleFillValueError::new(
                data_type.to_string(),
                fill_value,
            ))
        }
    }

    /// Create a new [`ChunkRepresentation`] with a different shape and the same data type and fill value.
    #[must_use]
    pub fn with_shape(&self, shape: ChunkShape) -> Self {
        Self {
            shape,
            data_type: self.data_type,
            fill_value: self.fill_value.clone(),
        }
    }

    /// Return the shape of the chunk.
    #[must_use]
    pub fn shape(&self) -> &[NonZeroU64] {
        &self.shape
    }

    /// Return the shape of the chunk as an [`ArrayShape`].
    #[must_use]
    pub fn shape_u64(&self) -> ArrayShape {
        self.shape.to_array_shape()
    }

    /// Return the dimensionality of the chunk.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the data type of the chunk.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the chunk.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the number of elements in the chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.num_elements()
    }

    /// Return the number of elements in the chunk as a [`usize`].
    ///
    /// Saturates at [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap_or(usize::MAX)
    }

    /// Return the element size in bytes.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.data_type.size()
    }

    /// Return the size of the chunk in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.num_elements() * self.data_type.size() as u64
    }

    /// Return the bytes of a chunk where every element is the fill value.
    #[must_use]
    pub fn fill_bytes(&self) -> Vec<u8> {
        self.fill_value.repeat(self.num_elements_usize())
    }
}
