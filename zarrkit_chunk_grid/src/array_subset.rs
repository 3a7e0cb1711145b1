//! Array subsets.
//!
//! An [`ArraySubset`] represents a subset of an array or chunk.
//!
//! [`iterators`](crate::iterators) includes the [`ArraySubset`] iterators.
//!
//! This module also provides convenience functions for:
//!  - computing the byte ranges of array subsets within an array with a fixed element size,
//!  - extracting the bytes of a subset of an array and updating a subset of an array with new bytes.

use std::fmt::{Debug, Display};
use std::num::NonZeroU64;
use std::ops::Range;

use thiserror::Error;

use crate::iterators::{ContiguousLinearisedIndices, Indices};
use crate::{check_dimensionality, ArrayIndices, ArrayShape, ChunkShape, IncompatibleDimensionalityError, IndexerError};

/// An array subset error.
#[derive(Clone, Debug, Error)]
#[allow(missing_docs)]
pub enum ArraySubsetError {
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// Incompatible start and shape.
    #[error("incompatible start {start:?} with shape {shape:?}")]
    IncompatibleStartShape {
        start: ArrayIndices,
        shape: ArrayShape,
    },
    /// Incompatible start and end indices.
    #[error("incompatible start {start:?} with end {end:?}")]
    IncompatibleStartEnd {
        start: ArrayIndices,
        end: ArrayIndices,
    },
    /// Incompatible offset.
    #[error("incompatible offset {offset:?} for region with start {start:?}")]
    IncompatibleOffset {
        start: ArrayIndices,
        offset: ArrayIndices,
    },
}

/// An array subset.
///
/// The subset is defined by a `start` and a `shape` with one component per dimension.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_ranges().fmt(f)
    }
}

impl<T: IntoIterator<Item = Range<u64>>> From<T> for ArraySubset {
    fn from(ranges: T) -> Self {
        let (start, shape) = ranges
            .into_iter()
            .map(|range| (range.start, range.end.saturating_sub(range.start)))
            .unzip();
        Self { start, shape }
    }
}

impl ArraySubset {
    /// Create a new empty array subset.
    #[must_use]
    pub fn new_empty(dimensionality: usize) -> Self {
        Self {
            start: vec![0; dimensionality],
            shape: vec![0; dimensionality],
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        Self::from(ranges.iter().cloned())
    }

    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the lengths of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, ArraySubsetError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(ArraySubsetError::IncompatibleStartShape { start, shape })
        }
    }

    /// Create a new array subset from a start and end (exclusive).
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if `start` and `end` are incompatible, such as if any element of `end` is less than `start` or they differ in length.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: ArrayIndices,
    ) -> Result<Self, ArraySubsetError> {
        if start.len() != end.len() || std::iter::zip(&start, &end).any(|(start, end)| end < start)
        {
            Err(ArraySubsetError::IncompatibleStartEnd { start, end })
        } else {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, end)| end - start)
                .collect();
            Ok(Self { start, shape })
        }
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns an error if `end` does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, ArraySubsetError> {
        check_dimensionality(end.len(), self.dimensionality())?;
        let start: ArrayIndices = std::iter::zip(&self.start, end)
            .map(|(&a, &b)| std::cmp::min(a, b))
            .collect();
        let end = std::iter::zip(self.end_exc(), end)
            .map(|(a, &b)| std::cmp::min(a, b))
            .collect();
        Self::new_with_start_end_exc(start, end)
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the shape of the array subset as a chunk shape.
    ///
    /// Returns [`None`] if any dimension of the shape is zero.
    #[must_use]
    pub fn chunk_shape(&self) -> Option<ChunkShape> {
        self.shape.iter().map(|s| NonZeroU64::new(*s)).collect()
    }

    /// Returns if the array subset is empty (i.e. has a zero element in its shape).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|i| i == &0)
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the end (exclusive) of the array subset.
    ///
    /// Components that would exceed [`u64::MAX`] saturate, see [`ArraySubset::checked_end_exc`].
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start.saturating_add(*size))
            .collect()
    }

    /// Return the end (exclusive) of the array subset.
    ///
    /// Returns [`None`] if any component exceeds [`u64::MAX`].
    #[must_use]
    pub fn checked_end_exc(&self) -> Option<ArrayIndices> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start.checked_add(*size))
            .collect()
    }

    /// Return the end (inclusive) of the array subset.
    ///
    /// Returns [`None`] if the array subset is empty.
    #[must_use]
    pub fn end_inc(&self) -> Option<ArrayIndices> {
        if self.is_empty() {
            None
        } else {
            Some(
                std::iter::zip(&self.start, &self.shape)
                    .map(|(start, size)| start.saturating_add(size - 1))
                    .collect(),
            )
        }
    }

    /// Return the array subset as a vec of ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start.saturating_add(size))
            .collect()
    }

    /// Returns true if `indices` lie within the array subset.
    #[must_use]
    pub fn contains(&self, indices: &[u64]) -> bool {
        indices.len() == self.dimensionality()
            && itertools::izip!(indices, &self.start, &self.shape)
                .all(|(&i, &o, &s)| i >= o && i - o < s)
    }

    /// Returns true if the array subset is within the bounds of an array with shape `array_shape`.
    ///
    /// A subset whose end exceeds [`u64::MAX`] is never in bounds.
    #[must_use]
    pub fn inbounds_shape(&self, array_shape: &[u64]) -> bool {
        array_shape.len() == self.dimensionality()
            && itertools::izip!(&self.start, &self.shape, array_shape).all(|(start, size, &shape)| {
                start.checked_add(*size).is_some_and(|end| end <= shape)
            })
    }

    /// Returns true if the array subset is within the bounds of `subset`.
    #[must_use]
    pub fn inbounds(&self, subset: &ArraySubset) -> bool {
        let Some(end) = self.checked_end_exc() else {
            return false;
        };
        subset.dimensionality() == self.dimensionality()
            && itertools::izip!(&self.start, end, &subset.start, subset.end_exc())
                .all(|(&start, end, &outer_start, outer_end)| {
                    start >= outer_start && end <= outer_end
                })
    }

    /// Return the overlapping subset between this array subset and `subset_other`.
    ///
    /// The result is empty if the subsets do not intersect.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does not match the dimensionality of this array subset.
    pub fn overlap(&self, subset_other: &ArraySubset) -> Result<Self, IncompatibleDimensionalityError> {
        check_dimensionality(subset_other.dimensionality(), self.dimensionality())?;
        let (start, shape) = itertools::izip!(
            &self.start,
            self.end_exc(),
            &subset_other.start,
            subset_other.end_exc()
        )
        .map(|(&start, end, &other_start, other_end)| {
            let overlap_start = std::cmp::max(start, other_start);
            let overlap_end = std::cmp::min(end, other_end);
            (overlap_start, overlap_end.saturating_sub(overlap_start))
        })
        .unzip();
        Ok(Self { start, shape })
    }

    /// Return the subset relative to `start`.
    ///
    /// Creates an array subset starting at [`ArraySubset::start()`] - `start`.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the length of `start` does not match the dimensionality of this array subset, or any component of `start` exceeds the start of this array subset.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, ArraySubsetError> {
        check_dimensionality(start.len(), self.dimensionality())?;
        if std::iter::zip(&self.start, start).any(|(&a, &b)| b > a) {
            return Err(ArraySubsetError::IncompatibleOffset {
                start: self.start.clone(),
                offset: start.to_vec(),
            });
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start)
                .map(|(a, b)| a - b)
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Return the subset offset by `offset`.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the length of `offset` does not match the dimensionality of this array subset or the offset end would exceed [`u64::MAX`].
    pub fn offset(&self, offset: &[u64]) -> Result<Self, ArraySubsetError> {
        check_dimensionality(offset.len(), self.dimensionality())?;
        let start: Option<ArrayIndices> = itertools::izip!(&self.start, &self.shape, offset)
            .map(|(start, size, offset)| {
                let start = start.checked_add(*offset)?;
                start.checked_add(*size).map(|_| start)
            })
            .collect();
        let Some(start) = start else {
            return Err(ArraySubsetError::IncompatibleOffset {
                start: self.start.clone(),
                offset: offset.to_vec(),
            });
        };
        Ok(Self {
            start,
            shape: self.shape.clone(),
        })
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Returns an iterator over the linearised indices of contiguous elements within the subset.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the `array_shape` does not encapsulate this array subset.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndices, IndexerError> {
        ContiguousLinearisedIndices::new(self, array_shape.to_vec())
    }

    /// Returns an iterator over the byte ranges of contiguous elements of this subset within an array of shape `array_shape` and element size `element_size`.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the `array_shape` does not encapsulate this array subset.
    pub fn iter_contiguous_byte_ranges(
        &self,
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<impl Iterator<Item = Range<u64>>, IndexerError> {
        let element_size = element_size as u64;
        Ok(self
            .contiguous_linearised_indices(array_shape)?
            .into_iter()
            .map(move |(index, elements)| {
                let byte_index = index * element_size;
                byte_index..byte_index + elements * element_size
            }))
    }

    /// Extract the bytes of this subset from `bytes`, an array with shape `array_shape` and element size `element_size`.
    ///
    /// The output is in C order with the shape of the subset.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the `array_shape` does not encapsulate this array subset or `bytes` has an unexpected length.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, IndexerError> {
        check_bytes_len(bytes.len(), array_shape, element_size)?;
        let mut output = Vec::with_capacity(usize_len(self.num_elements(), element_size));
        for byte_range in self.iter_contiguous_byte_ranges(array_shape, element_size)? {
            output.extend_from_slice(&bytes[range_usize(&byte_range)]);
        }
        Ok(output)
    }

    /// Overwrite this subset of `bytes`, an array with shape `array_shape` and element size `element_size`, with `subset_bytes`.
    ///
    /// `subset_bytes` holds the elements of the subset in C order.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the `array_shape` does not encapsulate this array subset or either input has an unexpected length.
    pub fn update_bytes(
        &self,
        bytes: &mut [u8],
        array_shape: &[u64],
        subset_bytes: &[u8],
        element_size: usize,
    ) -> Result<(), IndexerError> {
        check_bytes_len(bytes.len(), array_shape, element_size)?;
        check_bytes_len(subset_bytes.len(), &self.shape, element_size)?;
        let mut offset = 0;
        for byte_range in self.iter_contiguous_byte_ranges(array_shape, element_size)? {
            let byte_range = range_usize(&byte_range);
            let length = byte_range.len();
            bytes[byte_range].copy_from_slice(&subset_bytes[offset..offset + length]);
            offset += length;
        }
        Ok(())
    }
}

fn usize_len(num_elements: u64, element_size: usize) -> usize {
    usize::try_from(num_elements).unwrap_or(usize::MAX).saturating_mul(element_size)
}

#[allow(clippy::cast_possible_truncation)]
fn range_usize(range: &Range<u64>) -> Range<usize> {
    // Ranges are within a byte slice, so they always fit in a usize.
    range.start as usize..range.end as usize
}

fn check_bytes_len(len: usize, shape: &[u64], element_size: usize) -> Result<(), IndexerError> {
    let expected = usize_len(shape.iter().product(), element_size);
    if len == expected {
        Ok(())
    } else {
        Err(IndexerError::IncompatibleLength(len, expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset() {
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10]).is_ok());
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10]).is_err());
        assert!(ArraySubset::new_with_start_end_exc(vec![0, 0], vec![10, 10]).is_ok());
        assert!(ArraySubset::new_with_start_end_exc(vec![0, 0], vec![10]).is_err());
        assert!(ArraySubset::new_with_start_end_exc(vec![5, 5], vec![0, 0]).is_err());
        let array_subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10])
            .unwrap()
            .bound(&[5, 5])
            .unwrap();
        assert_eq!(array_subset.shape(), &[5, 5]);
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10])
            .unwrap()
            .bound(&[5, 5, 5])
            .is_err());

        let array_subset0 = ArraySubset::new_with_ranges(&[1..5, 2..6]);
        let array_subset1 = ArraySubset::new_with_ranges(&[3..6, 4..7]);
        assert_eq!(
            array_subset0.overlap(&array_subset1).unwrap(),
            ArraySubset::new_with_ranges(&[3..5, 4..6])
        );
        assert!(array_subset0
            .overlap(&ArraySubset::new_with_ranges(&[6..7, 0..1]))
            .unwrap()
            .is_empty());
        assert_eq!(
            array_subset0.relative_to(&[1, 1]).unwrap(),
            ArraySubset::new_with_ranges(&[0..4, 1..5])
        );
        assert!(array_subset0.relative_to(&[1, 1, 1]).is_err());
        assert!(array_subset0.relative_to(&[2, 1]).is_err());
        assert_eq!(
            array_subset0.offset(&[1, 1]).unwrap(),
            ArraySubset::new_with_ranges(&[2..6, 3..7])
        );
        assert!(array_subset0.inbounds_shape(&[10, 10]));
        assert!(!array_subset0.inbounds_shape(&[2, 2]));
        assert!(!array_subset0.inbounds_shape(&[10, 10, 10]));
        assert!(array_subset0.inbounds(&ArraySubset::new_with_ranges(&[0..6, 1..7])));
        assert!(array_subset0.inbounds(&ArraySubset::new_with_ranges(&[1..5, 2..6])));
        assert!(!array_subset0.inbounds(&ArraySubset::new_with_ranges(&[2..5, 2..6])));
        assert!(!array_subset0.inbounds(&ArraySubset::new_with_ranges(&[1..5, 2..5])));
        assert!(!array_subset0.inbounds(&ArraySubset::new_with_ranges(&[2..5])));
        assert!(array_subset0.contains(&[1, 5]));
        assert!(!array_subset0.contains(&[5, 5]));
        assert_eq!(array_subset0.to_ranges(), vec![1..5, 2..6]);
        assert_eq!(array_subset0.end_exc(), vec![5, 6]);
        assert_eq!(array_subset0.end_inc(), Some(vec![4, 5]));
        assert_eq!(ArraySubset::new_empty(2).end_inc(), None);
        assert_eq!(array_subset0.to_string(), "[1..5, 2..6]");

        let array_subset2 = ArraySubset::new_with_ranges(&[3..6, 4..7, 0..1]);
        assert!(array_subset0.overlap(&array_subset2).is_err());
    }

    #[test]
    fn array_subset_end_overflow() {
        let array_subset = ArraySubset::new_with_start_shape(vec![u64::MAX], vec![2]).unwrap();
        assert_eq!(array_subset.checked_end_exc(), None);
        assert_eq!(array_subset.end_exc(), vec![u64::MAX]);
        assert!(!array_subset.inbounds_shape(&[10]));
        assert!(!array_subset.inbounds_shape(&[u64::MAX]));
        assert!(!array_subset.inbounds(&ArraySubset::new_with_shape(vec![u64::MAX])));
        assert!(!array_subset.contains(&[1]));
        assert!(array_subset.contains(&[u64::MAX]));
        assert!(array_subset
            .iter_contiguous_byte_ranges(&[u64::MAX], 1)
            .is_err());

        let array_subset = ArraySubset::new_with_start_shape(vec![u64::MAX - 2], vec![2]).unwrap();
        assert_eq!(array_subset.checked_end_exc(), Some(vec![u64::MAX]));
        assert!(array_subset.inbounds_shape(&[u64::MAX]));
        assert!(array_subset.offset(&[1]).is_err());
        assert!(ArraySubset::new_with_ranges(&[0..2]).offset(&[u64::MAX]).is_err());
    }

    #[test]
    fn array_subset_bytes() {
        let array_subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);

        assert!(array_subset.iter_contiguous_byte_ranges(&[1, 1], 1).is_err());
        let ranges = array_subset
            .iter_contiguous_byte_ranges(&[4, 4], 1)
            .unwrap()
            .collect::<Vec<_>>();
        assert_eq!(ranges, vec![5..7, 9..11]);

        let ranges = ArraySubset::new_with_ranges(&[1..3, 0..4])
            .iter_contiguous_byte_ranges(&[4, 4], 2)
            .unwrap()
            .collect::<Vec<_>>();
        assert_eq!(ranges, vec![8..24]);
    }

    #[test]
    fn array_subset_extract_update() {
        let bytes: Vec<u8> = (0..16).collect();
        let array_subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let extracted = array_subset.extract_bytes(&bytes, &[4, 4], 1).unwrap();
        assert_eq!(extracted, vec![5, 6, 9, 10]);
        assert!(array_subset.extract_bytes(&bytes, &[4, 5], 1).is_err());

        let mut bytes = bytes;
        array_subset
            .update_bytes(&mut bytes, &[4, 4], &[100, 101, 102, 103], 1)
            .unwrap();
        assert_eq!(
            bytes,
            vec![0, 1, 2, 3, 4, 100, 101, 7, 8, 102, 103, 11, 12, 13, 14, 15]
        );
        assert!(array_subset
            .update_bytes(&mut bytes, &[4, 4], &[0; 3], 1)
            .is_err());
    }
}
