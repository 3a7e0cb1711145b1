//! The chunk grid and region indexing API for the [`zarrkit`](https://docs.rs/zarrkit/latest/zarrkit/index.html) crate.
//!
//! A chunk grid partitions the domain of an array into chunks:
//!  - [`RegularChunkGrid`]: maps array indices to chunk indices and intra-chunk offsets for a fixed chunk shape,
//!  - [`ArraySubset`]: a rectangular region of an array or chunk,
//!  - [`ChunkWorkItem`]: one piece of a region decomposed against the chunk grid (see [`RegularChunkGrid::work_items`]).
//!
//! ## Licence
//! `zarrkit_chunk_grid` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod array_subset;
mod indexer;
pub mod iterators;
mod regular;

pub use array_subset::{ArraySubset, ArraySubsetError};
pub use indexer::{ChunkWorkItem, IndexerError};
pub use regular::{RegularChunkGrid, RegularChunkGridCreateError};
pub use zarrkit_metadata::{ArrayShape, ChunkShape};

use thiserror::Error;

/// An ND index to an element in an array or chunk.
pub type ArrayIndices = Vec<u64>;

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }

    /// Return the dimensionality that was received.
    #[must_use]
    pub const fn got(&self) -> usize {
        self.0
    }

    /// Return the expected dimensionality.
    #[must_use]
    pub const fn expected(&self) -> usize {
        self.1
    }
}

/// Check that `got` matches the `expected` dimensionality.
///
/// # Errors
/// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
pub fn check_dimensionality(got: usize, expected: usize) -> Result<(), IncompatibleDimensionalityError> {
    if got == expected {
        Ok(())
    } else {
        Err(IncompatibleDimensionalityError(got, expected))
    }
}

/// Traits for a chunk shape.
pub trait ChunkShapeTraits {
    /// Convert a chunk shape to an array shape.
    #[must_use]
    fn to_array_shape(&self) -> ArrayShape;

    /// Return the number of elements.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    fn num_elements(&self) -> u64;
}

impl ChunkShapeTraits for [std::num::NonZeroU64] {
    fn to_array_shape(&self) -> ArrayShape {
        self.iter().map(|i| i.get()).collect()
    }

    fn num_elements(&self) -> u64 {
        self.iter().map(|i| i.get()).product()
    }
}

/// Ravel ND indices to a linearised index in C order.
///
/// Returns [`None`] if `indices` is out of bounds of `shape` or the dimensionalities differ.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> Option<u64> {
    if indices.len() != shape.len() {
        return None;
    }
    let mut index: u64 = 0;
    let mut count = 1;
    for (&i, &s) in std::iter::zip(indices, shape).rev() {
        if i >= s {
            return None;
        }
        index += i * count;
        count *= s;
    }
    Some(index)
}

/// Unravel a linearised index in C order to ND indices.
///
/// Returns [`None`] if `index` is out of bounds of `shape`.
#[must_use]
pub fn unravel_index(index: u64, shape: &[u64]) -> Option<ArrayIndices> {
    let mut remainder = index;
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        if dim == 0 {
            return None;
        }
        *indices_i = remainder % dim;
        remainder /= dim;
    }
    (remainder == 0).then_some(indices)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;

    #[test]
    fn ravel_unravel() {
        let shape = [5, 5, 5];
        assert_eq!(ravel_indices(&[2, 3, 4], &shape), Some(2 * 25 + 3 * 5 + 4));
        assert_eq!(ravel_indices(&[2, 3, 5], &shape), None);
        assert_eq!(ravel_indices(&[2, 3], &shape), None);
        assert_eq!(unravel_index(2 * 25 + 3 * 5 + 4, &shape), Some(vec![2, 3, 4]));
        assert_eq!(unravel_index(125, &shape), None);
        assert_eq!(unravel_index(0, &[]), Some(vec![]));
        assert_eq!(unravel_index(0, &[3, 0]), None);
        for index in 0..125 {
            let indices = unravel_index(index, &shape).unwrap();
            assert_eq!(ravel_indices(&indices, &shape), Some(index));
        }
    }

    #[test]
    fn chunk_shape_traits() {
        let chunk_shape: Vec<NonZeroU64> = vec![
            NonZeroU64::new(2).unwrap(),
            NonZeroU64::new(8).unwrap(),
        ];
        assert_eq!(chunk_shape.to_array_shape(), vec![2, 8]);
        assert_eq!(chunk_shape.num_elements(), 16);
    }

    #[test]
    fn incompatible_dimensionality() {
        assert!(check_dimensionality(2, 2).is_ok());
        let err = check_dimensionality(1, 2).unwrap_err();
        assert_eq!(err.got(), 1);
        assert_eq!(err.expected(), 2);
        assert_eq!(err.to_string(), "incompatible dimensionality 1, expected 2");
    }
}
