use std::iter::FusedIterator;

use crate::{ravel_indices, ArrayShape, ArraySubset, IndexerError};

use super::{Indices, IndicesIterator};

/// Iterates over contiguous linearised element indices in an array subset.
///
/// The iterator item is a tuple: (linearised index, # contiguous elements).
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a 4x3 array with linearised element indices
/// ```text
/// 0   1   2
/// 3   4   5
/// 6   7   8
/// 9  10  11
/// ```
/// An iterator with an array subset covering the entire array will produce
/// ```rust,ignore
/// [(0, 12)]
/// ```
/// An iterator with an array subset corresponding to the lower right 2x2 region will produce
/// ```rust,ignore
/// [(7, 2), (10, 2)]
/// ```
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndices {
    outer: Indices,
    contiguous_elements: u64,
    array_shape: ArrayShape,
}

impl ContiguousLinearisedIndices {
    /// Return a new contiguous linearised indices iterator.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the `subset` does not fit within `array_shape`.
    pub fn new(subset: &ArraySubset, array_shape: ArrayShape) -> Result<Self, IndexerError> {
        if !subset.inbounds_shape(&array_shape) {
            return Err(IndexerError::new_oob(subset.clone(), array_shape));
        }

        // Collapse trailing dimensions that span the whole array into one run
        let mut contiguous = true;
        let mut contiguous_elements = 1;
        let mut outer_shape = Vec::with_capacity(subset.dimensionality());
        for (&subset_size, &array_size) in
            std::iter::zip(subset.shape().iter().rev(), array_shape.iter().rev())
        {
            if contiguous {
                contiguous_elements *= subset_size;
                outer_shape.push(1);
                contiguous = subset_size == array_size;
            } else {
                outer_shape.push(subset_size);
            }
        }
        outer_shape.reverse();

        let outer = if subset.is_empty() {
            Indices::new(ArraySubset::new_empty(subset.dimensionality()))
        } else {
            Indices::new(ArraySubset::from(
                std::iter::zip(subset.start(), outer_shape).map(|(&start, size)| start..start + size),
            ))
        };
        Ok(Self {
            outer,
            contiguous_elements,
            array_shape,
        })
    }

    /// Return the number of contiguous runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    /// Returns true if there are no contiguous runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Return the number of contiguous elements (fixed on each iteration).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ContiguousLinearisedIndicesIterator {
        self.clone().into_iter()
    }
}

impl IntoIterator for ContiguousLinearisedIndices {
    type Item = (u64, u64);
    type IntoIter = ContiguousLinearisedIndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        ContiguousLinearisedIndicesIterator {
            inner: self.outer.into_iter(),
            contiguous_elements: self.contiguous_elements,
            array_shape: self.array_shape,
        }
    }
}

/// Serial contiguous linearised indices iterator.
///
/// See [`ContiguousLinearisedIndices`].
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndicesIterator {
    inner: IndicesIterator,
    contiguous_elements: u64,
    array_shape: ArrayShape,
}

impl ContiguousLinearisedIndicesIterator {
    /// Return the number of contiguous elements (fixed on each iteration).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    fn item(&self, indices: &[u64]) -> (u64, u64) {
        // The outer subset was checked to be within the array shape on creation
        let index = ravel_indices(indices, &self.array_shape).unwrap_or_default();
        (index, self.contiguous_elements)
    }
}

impl Iterator for ContiguousLinearisedIndicesIterator {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.inner.next()?;
        Some(self.item(&indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for ContiguousLinearisedIndicesIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        let indices = self.inner.next_back()?;
        Some(self.item(&indices))
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator {}

impl FusedIterator for ContiguousLinearisedIndicesIterator {}
