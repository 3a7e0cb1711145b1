use std::iter::FusedIterator;
use std::ops::Range;

use crate::{ArrayIndices, ArraySubset};

/// An iterator over the indices in an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// An iterator with an array subset corresponding to the lower right 2x2 region will produce `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
#[derive(Clone, Debug)]
pub struct Indices {
    subset: ArraySubset,
    range: Range<u64>,
}

impl Indices {
    /// Create a new indices struct.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements();
        Self {
            subset,
            range: 0..length,
        }
    }

    /// Return the number of indices.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start) as usize
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator {
        self.clone().into_iter()
    }
}

impl IntoIterator for Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator {
            subset: self.subset,
            range: self.range,
        }
    }
}

/// Serial indices iterator.
///
/// See [`Indices`].
#[derive(Clone, Debug)]
pub struct IndicesIterator {
    subset: ArraySubset,
    range: Range<u64>,
}

impl IndicesIterator {
    /// Unravel `index` within the subset shape and offset by the subset start.
    fn indices(&self, mut index: u64) -> ArrayIndices {
        let mut indices = self.subset.start().to_vec();
        let shape = self.subset.shape();
        for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
            *indices_i += index % dim;
            index /= dim;
        }
        indices
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.range.next()?;
        Some(self.indices(index))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = self.range.end.saturating_sub(self.range.start) as usize;
        (length, Some(length))
    }
}

impl DoubleEndedIterator for IndicesIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.range.next_back()?;
        Some(self.indices(index))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}
