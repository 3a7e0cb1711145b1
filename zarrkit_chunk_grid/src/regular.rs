//! The `regular` chunk grid.
//!
//! Every chunk has the same shape. Chunks on the upper boundary of an array may extend beyond the array shape.

use std::num::NonZeroU64;

use thiserror::Error;
use zarrkit_metadata::{
    chunk_grid::regular::{RegularChunkGridConfiguration, IDENTIFIER},
    ArrayShape, ChunkShape, ConfigurationInvalidError, MetadataV3,
};

use crate::{
    check_dimensionality, iterators::Indices, ArrayIndices, ArraySubset, ChunkShapeTraits,
    IncompatibleDimensionalityError,
};

/// A regular chunk grid creation error.
#[derive(Clone, Debug, Error)]
pub enum RegularChunkGridCreateError {
    /// The chunk shape and array shape have different dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The chunk grid is not `regular` or its configuration is invalid.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigurationInvalidError),
}

/// A `regular` chunk grid.
///
/// The chunk grid maps array indices to chunk indices and intra-chunk element indices.
/// The dimensionality of the array and chunk shape are validated on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularChunkGrid {
    array_shape: ArrayShape,
    chunk_shape: ChunkShape,
    grid_shape: ArrayShape,
}

impl RegularChunkGrid {
    /// Create a new `regular` chunk grid for an array with `array_shape` and chunks with `chunk_shape`.
    ///
    /// # Errors
    /// Returns [`RegularChunkGridCreateError`] if `chunk_shape` and `array_shape` have different dimensionality.
    pub fn new(
        array_shape: ArrayShape,
        chunk_shape: ChunkShape,
    ) -> Result<Self, RegularChunkGridCreateError> {
        check_dimensionality(chunk_shape.len(), array_shape.len())?;
        let grid_shape = std::iter::zip(&array_shape, &chunk_shape)
            .map(|(a, c)| a.div_ceil(c.get()))
            .collect();
        Ok(Self {
            array_shape,
            chunk_shape,
            grid_shape,
        })
    }

    /// Create a `regular` chunk grid from chunk grid metadata.
    ///
    /// # Errors
    /// Returns [`RegularChunkGridCreateError`] if the metadata is not a valid `regular` chunk grid or its dimensionality does not match `array_shape`.
    pub fn from_metadata(
        metadata: &MetadataV3,
        array_shape: ArrayShape,
    ) -> Result<Self, RegularChunkGridCreateError> {
        if metadata.name() != IDENTIFIER {
            return Err(ConfigurationInvalidError::new(
                metadata.name().to_string(),
                metadata.configuration().cloned(),
            )
            .into());
        }
        let configuration: RegularChunkGridConfiguration = metadata.to_configuration()?;
        Self::new(array_shape, configuration.chunk_shape)
    }

    /// Create the chunk grid metadata.
    #[must_use]
    pub fn create_metadata(&self) -> MetadataV3 {
        let configuration = RegularChunkGridConfiguration::from(self.chunk_shape.clone());
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| MetadataV3::new(IDENTIFIER))
    }

    /// Return the dimensionality of the chunk grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// Return the array shape.
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Return the chunk shape as an [`ArrayShape`].
    #[must_use]
    pub fn chunk_shape_u64(&self) -> ArrayShape {
        self.chunk_shape.to_array_shape()
    }

    /// Return the number of chunks along each dimension.
    ///
    /// Partial chunks on the upper boundary of the array are included.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Returns true if `chunk_indices` refers to a chunk in the grid.
    #[must_use]
    pub fn chunk_indices_inbounds(&self, chunk_indices: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && std::iter::zip(chunk_indices, &self.grid_shape).all(|(i, g)| i < g)
    }

    /// Return the indices of the chunk holding the element at `array_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `array_indices` do not match the dimensionality of the chunk grid.
    pub fn chunk_indices(
        &self,
        array_indices: &[u64],
    ) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        check_dimensionality(array_indices.len(), self.dimensionality())?;
        Ok(std::iter::zip(array_indices, &self.chunk_shape)
            .map(|(i, c)| i / c.get())
            .collect())
    }

    /// Return the indices of the element at `array_indices` relative to the origin of its chunk.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `array_indices` do not match the dimensionality of the chunk grid.
    pub fn chunk_element_indices(
        &self,
        array_indices: &[u64],
    ) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        check_dimensionality(array_indices.len(), self.dimensionality())?;
        Ok(std::iter::zip(array_indices, &self.chunk_shape)
            .map(|(i, c)| i % c.get())
            .collect())
    }

    /// Return the array indices of the first element of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` do not match the dimensionality of the chunk grid.
    pub fn chunk_origin(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        check_dimensionality(chunk_indices.len(), self.dimensionality())?;
        Ok(std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(i, c)| i * c.get())
            .collect())
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// The subset always has the chunk shape, even if it extends beyond the array shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` do not match the dimensionality of the chunk grid.
    pub fn subset(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        let origin = self.chunk_origin(chunk_indices)?;
        Ok(ArraySubset::from(
            std::iter::zip(origin, &self.chunk_shape).map(|(o, c)| o..o + c.get()),
        ))
    }

    /// Return the array subset of the chunk at `chunk_indices` bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` do not match the dimensionality of the chunk grid.
    pub fn subset_bounded(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        let subset = self.subset(chunk_indices)?;
        Ok(ArraySubset::from(
            std::iter::zip(subset.to_ranges(), &self.array_shape)
                .map(|(range, &a)| range.start.min(a)..range.end.min(a)),
        ))
    }

    /// Return the subset of chunk indices of the chunks intersecting `array_subset`.
    ///
    /// The result is empty if `array_subset` is empty.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `array_subset` does not match the dimensionality of the chunk grid.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        check_dimensionality(array_subset.dimensionality(), self.dimensionality())?;
        if array_subset.is_empty() {
            return Ok(ArraySubset::new_empty(self.dimensionality()));
        }
        Ok(ArraySubset::from(
            itertools::izip!(array_subset.start(), array_subset.shape(), &self.chunk_shape)
                .map(|(&start, &size, c)| {
                    start / c.get()..start.saturating_add(size - 1) / c.get() + 1
                }),
        ))
    }

    /// Returns an iterator over the indices of every chunk in the grid in C order.
    #[must_use]
    pub fn iter_chunk_indices(&self) -> Indices {
        ArraySubset::new_with_shape(self.grid_shape.clone()).indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_shape(shape: &[u64]) -> ChunkShape {
        shape.iter().map(|&s| NonZeroU64::new(s).unwrap()).collect()
    }

    #[test]
    fn chunk_grid_regular() {
        let chunk_grid = RegularChunkGrid::new(vec![5, 7, 52], chunk_shape(&[1, 2, 3])).unwrap();
        assert_eq!(chunk_grid.dimensionality(), 3);
        assert_eq!(chunk_grid.grid_shape(), &[5, 4, 18]);
        assert_eq!(chunk_grid.chunk_shape_u64(), vec![1, 2, 3]);

        let array_indices = [3, 5, 50];
        assert_eq!(chunk_grid.chunk_indices(&array_indices).unwrap(), vec![3, 2, 16]);
        assert_eq!(
            chunk_grid.chunk_element_indices(&array_indices).unwrap(),
            vec![0, 1, 2]
        );
        assert_eq!(chunk_grid.chunk_origin(&[3, 2, 16]).unwrap(), vec![3, 4, 48]);
        assert!(chunk_grid.chunk_indices(&[3, 5]).is_err());
        assert!(chunk_grid.chunk_origin(&[3, 5]).is_err());

        assert!(chunk_grid.chunk_indices_inbounds(&[4, 3, 17]));
        assert!(!chunk_grid.chunk_indices_inbounds(&[4, 4, 17]));
        assert!(!chunk_grid.chunk_indices_inbounds(&[4, 3]));

        assert_eq!(
            chunk_grid.subset(&[4, 3, 17]).unwrap(),
            ArraySubset::new_with_ranges(&[4..5, 6..8, 51..54])
        );
        assert_eq!(
            chunk_grid.subset_bounded(&[4, 3, 17]).unwrap(),
            ArraySubset::new_with_ranges(&[4..5, 6..7, 51..52])
        );
    }

    #[test]
    fn chunk_grid_regular_dimensionality() {
        assert!(RegularChunkGrid::new(vec![5, 7], chunk_shape(&[1, 2, 3])).is_err());
    }

    #[test]
    fn chunk_grid_regular_chunks_in_array_subset() {
        let chunk_grid = RegularChunkGrid::new(vec![10, 10], chunk_shape(&[5, 5])).unwrap();
        assert_eq!(
            chunk_grid
                .chunks_in_array_subset(&ArraySubset::new_with_ranges(&[2..10, 2..10]))
                .unwrap(),
            ArraySubset::new_with_ranges(&[0..2, 0..2])
        );
        assert_eq!(
            chunk_grid
                .chunks_in_array_subset(&ArraySubset::new_with_ranges(&[5..6, 0..5]))
                .unwrap(),
            ArraySubset::new_with_ranges(&[1..2, 0..1])
        );
        assert!(chunk_grid
            .chunks_in_array_subset(&ArraySubset::new_with_ranges(&[5..5, 0..5]))
            .unwrap()
            .is_empty());
        assert_eq!(chunk_grid.iter_chunk_indices().len(), 4);
    }

    #[test]
    fn chunk_grid_regular_metadata() {
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name":"regular","configuration":{"chunk_shape":[2,8]}}"#,
        )
        .unwrap();
        let chunk_grid = RegularChunkGrid::from_metadata(&metadata, vec![16, 16]).unwrap();
        assert_eq!(chunk_grid.grid_shape(), &[8, 2]);
        assert_eq!(chunk_grid.create_metadata(), metadata);

        assert!(RegularChunkGrid::from_metadata(&metadata, vec![16]).is_err());
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name":"rectangular","configuration":{"chunk_shape":[2,8]}}"#,
        )
        .unwrap();
        assert!(RegularChunkGrid::from_metadata(&metadata, vec![16, 16]).is_err());
    }

    #[test]
    fn chunk_grid_regular_0d() {
        let chunk_grid = RegularChunkGrid::new(vec![], vec![]).unwrap();
        assert_eq!(chunk_grid.iter_chunk_indices().len(), 1);
        assert_eq!(chunk_grid.chunk_indices(&[]).unwrap(), Vec::<u64>::new());
    }
}
