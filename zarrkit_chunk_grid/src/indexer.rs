//! Region decomposition against a chunk grid.

use std::ops::Range;

use derive_more::Display;
use itertools::Itertools;
use thiserror::Error;

use crate::{
    check_dimensionality, ArrayIndices, ArrayShape, ArraySubset, IncompatibleDimensionalityError,
    RegularChunkGrid,
};

/// An incompatible region and array shape error.
///
/// Raised if a region references an out-of-bounds element or the dimensionality differs.
#[derive(Clone, Debug, Error)]
pub enum IndexerError {
    /// The region dimensionality is incompatible.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The region references out-of-bounds array indices.
    #[error("region {0} is out-of-bounds of array shape {1:?}")]
    OutOfBounds(ArraySubset, ArrayShape),
    /// A buffer has an incompatible length.
    #[error("buffer has an incompatible length {0}, expected {1}")]
    IncompatibleLength(usize, usize),
}

impl IndexerError {
    /// Create a new [`IndexerError`] where the dimensionality is incompatible.
    #[must_use]
    pub fn new_incompatible_dimensionality(got: usize, expected: usize) -> Self {
        IncompatibleDimensionalityError::new(got, expected).into()
    }

    /// Create a new [`IndexerError`] representing an out-of-bounds region.
    #[must_use]
    pub fn new_oob(region: ArraySubset, shape: ArrayShape) -> Self {
        Self::OutOfBounds(region, shape)
    }
}

/// One piece of a region decomposed against a chunk grid.
///
/// `chunk_subset` and `region_subset` have the same shape.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
#[display("{chunk_indices:?}: {chunk_subset} -> {region_subset}")]
pub struct ChunkWorkItem {
    chunk_indices: ArrayIndices,
    chunk_subset: ArraySubset,
    region_subset: ArraySubset,
    is_full_chunk: bool,
}

impl ChunkWorkItem {
    /// The indices of the chunk.
    #[must_use]
    pub fn chunk_indices(&self) -> &[u64] {
        &self.chunk_indices
    }

    /// The selection within the chunk, relative to the chunk origin.
    #[must_use]
    pub fn chunk_subset(&self) -> &ArraySubset {
        &self.chunk_subset
    }

    /// The matching selection within the region buffer, relative to the region start.
    #[must_use]
    pub fn region_subset(&self) -> &ArraySubset {
        &self.region_subset
    }

    /// Returns true if the selection covers every element of the chunk within the array bounds.
    ///
    /// Elements of a boundary chunk beyond the array shape are not required to be covered.
    #[must_use]
    pub fn is_full_chunk(&self) -> bool {
        self.is_full_chunk
    }
}

/// The intersection of a region with one chunk along one dimension.
#[derive(Clone, Debug)]
struct DimensionInterval {
    chunk_index: u64,
    chunk_range: Range<u64>,
    region_range: Range<u64>,
    full: bool,
}

impl RegularChunkGrid {
    /// Decompose `region` into the chunks it intersects.
    ///
    /// Work items are ordered by ascending chunk indices, lexicographically by dimension.
    /// Their region subsets are pairwise disjoint and their union is the region.
    /// An empty region produces no work items.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the dimensionality of `region` does not match the chunk grid or it extends beyond the array shape.
    pub fn work_items(&self, region: &ArraySubset) -> Result<Vec<ChunkWorkItem>, IndexerError> {
        check_dimensionality(region.dimensionality(), self.dimensionality())?;
        if !region.inbounds_shape(self.array_shape()) {
            return Err(IndexerError::new_oob(
                region.clone(),
                self.array_shape().to_vec(),
            ));
        }
        if region.is_empty() {
            return Ok(vec![]);
        }

        let intervals: Vec<Vec<DimensionInterval>> = itertools::izip!(
            region.start(),
            region.shape(),
            self.chunk_shape(),
            self.array_shape()
        )
        .map(|(&offset, &size, chunk_size, &array_size)| {
            dimension_intervals(offset, size, chunk_size.get(), array_size)
        })
        .collect::<Option<_>>()
        .ok_or_else(|| IndexerError::new_oob(region.clone(), self.array_shape().to_vec()))?;

        if intervals.is_empty() {
            // A 0-dimensional array has a single chunk holding a single element
            return Ok(vec![ChunkWorkItem {
                chunk_indices: vec![],
                chunk_subset: ArraySubset::new_with_shape(vec![]),
                region_subset: ArraySubset::new_with_shape(vec![]),
                is_full_chunk: true,
            }]);
        }

        Ok(intervals
            .into_iter()
            .multi_cartesian_product()
            .map(|intervals| ChunkWorkItem {
                chunk_indices: intervals.iter().map(|i| i.chunk_index).collect(),
                chunk_subset: ArraySubset::from(intervals.iter().map(|i| i.chunk_range.clone())),
                region_subset: ArraySubset::from(intervals.iter().map(|i| i.region_range.clone())),
                is_full_chunk: intervals.iter().all(|i| i.full),
            })
            .collect())
    }
}

/// The chunks crossed by `[offset, offset + size)` along one dimension, in ascending order.
///
/// Returns [`None`] if the interval end exceeds [`u64::MAX`].
fn dimension_intervals(
    offset: u64,
    size: u64,
    chunk_size: u64,
    array_size: u64,
) -> Option<Vec<DimensionInterval>> {
    let end = offset.checked_add(size)?;
    let first = offset / chunk_size;
    let last = (end - 1) / chunk_size;
    let intervals = (first..=last)
        .map(|chunk_index| {
            let chunk_start = chunk_index * chunk_size;
            let chunk_end = chunk_start.saturating_add(chunk_size);
            let start = offset.max(chunk_start);
            let stop = end.min(chunk_end);
            DimensionInterval {
                chunk_index,
                chunk_range: start - chunk_start..stop - chunk_start,
                region_range: start - offset..stop - offset,
                full: start == chunk_start && stop == chunk_end.min(array_size),
            }
        })
        .collect();
    Some(intervals)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZeroU64;

    use super::*;

    fn grid(array_shape: &[u64], chunk_shape: &[u64]) -> RegularChunkGrid {
        RegularChunkGrid::new(
            array_shape.to_vec(),
            chunk_shape
                .iter()
                .map(|&c| NonZeroU64::new(c).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn work_items_partial() {
        let chunk_grid = grid(&[10, 10], &[5, 5]);
        let items = chunk_grid
            .work_items(&ArraySubset::new_with_ranges(&[2..10, 2..10]))
            .unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].chunk_indices(), &[0, 0]);
        assert_eq!(items[0].chunk_subset(), &ArraySubset::new_with_ranges(&[2..5, 2..5]));
        assert_eq!(items[0].region_subset(), &ArraySubset::new_with_ranges(&[0..3, 0..3]));
        assert!(!items[0].is_full_chunk());
        assert_eq!(items[1].chunk_indices(), &[0, 1]);
        assert_eq!(items[1].chunk_subset(), &ArraySubset::new_with_ranges(&[2..5, 0..5]));
        assert_eq!(items[1].region_subset(), &ArraySubset::new_with_ranges(&[0..3, 3..8]));
        assert_eq!(items[2].chunk_indices(), &[1, 0]);
        assert_eq!(items[3].chunk_indices(), &[1, 1]);
        assert_eq!(items[3].chunk_subset(), &ArraySubset::new_with_ranges(&[0..5, 0..5]));
        assert_eq!(items[3].region_subset(), &ArraySubset::new_with_ranges(&[3..8, 3..8]));
        assert!(items[3].is_full_chunk());
        assert_eq!(items[3].to_string(), "[1, 1]: [0..5, 0..5] -> [3..8, 3..8]");
    }

    #[test]
    fn work_items_full_array() {
        let chunk_grid = grid(&[16, 16], &[2, 8]);
        let items = chunk_grid
            .work_items(&ArraySubset::new_with_shape(vec![16, 16]))
            .unwrap();
        assert_eq!(items.len(), 16);
        assert!(items.iter().all(ChunkWorkItem::is_full_chunk));
        let chunk_indices: Vec<_> = items.iter().map(|i| i.chunk_indices().to_vec()).collect();
        let expected: Vec<_> = chunk_grid.iter_chunk_indices().into_iter().collect();
        assert_eq!(chunk_indices, expected);
    }

    #[test]
    fn work_items_boundary_chunk() {
        let chunk_grid = grid(&[7], &[5]);
        let items = chunk_grid
            .work_items(&ArraySubset::new_with_ranges(&[5..7]))
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].chunk_subset(), &ArraySubset::new_with_ranges(&[0..2]));
        assert!(items[0].is_full_chunk());

        let items = chunk_grid
            .work_items(&ArraySubset::new_with_ranges(&[6..7]))
            .unwrap();
        assert!(!items[0].is_full_chunk());
    }

    #[test]
    fn work_items_empty() {
        let chunk_grid = grid(&[10, 10], &[5, 5]);
        assert!(chunk_grid
            .work_items(&ArraySubset::new_with_ranges(&[2..10, 3..3]))
            .unwrap()
            .is_empty());
        let chunk_grid = grid(&[0, 10], &[5, 5]);
        assert!(chunk_grid
            .work_items(&ArraySubset::new_with_shape(vec![0, 10]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn work_items_0d() {
        let chunk_grid = grid(&[], &[]);
        let items = chunk_grid
            .work_items(&ArraySubset::new_with_shape(vec![]))
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_full_chunk());
    }

    #[test]
    fn work_items_invalid() {
        let chunk_grid = grid(&[10, 10], &[5, 5]);
        assert!(matches!(
            chunk_grid.work_items(&ArraySubset::new_with_ranges(&[0..11, 0..10])),
            Err(IndexerError::OutOfBounds(..))
        ));
        assert!(matches!(
            chunk_grid.work_items(&ArraySubset::new_with_ranges(&[0..10])),
            Err(IndexerError::IncompatibleDimensionality(..))
        ));
        let wrapping =
            ArraySubset::new_with_start_shape(vec![u64::MAX, 0], vec![2, 10]).unwrap();
        assert!(matches!(
            chunk_grid.work_items(&wrapping),
            Err(IndexerError::OutOfBounds(..))
        ));
    }

    #[test]
    fn dimension_intervals_end_overflow() {
        assert!(dimension_intervals(u64::MAX, 2, 5, 10).is_none());
        let intervals = dimension_intervals(u64::MAX - 3, 3, 5, u64::MAX).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].chunk_index, (u64::MAX - 3) / 5);
        assert_eq!(intervals[0].region_range, 0..3);
    }

    /// A small deterministic pseudo-random generator (xorshift).
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0 % bound
        }
    }

    #[test]
    fn work_items_cover_region_disjointly() {
        let mut rng = XorShift(0x2545_F491_4F6C_DD1D);
        for _ in 0..200 {
            let dimensionality = usize::try_from(rng.next(4) + 1).unwrap();
            let array_shape: Vec<u64> = (0..dimensionality).map(|_| rng.next(12) + 1).collect();
            let chunk_shape: Vec<u64> = (0..dimensionality).map(|_| rng.next(5) + 1).collect();
            let region = ArraySubset::from(array_shape.iter().map(|&a| {
                let start = rng.next(a + 1);
                let end = start + rng.next(a - start + 1);
                start..end
            }));
            let chunk_grid = grid(&array_shape, &chunk_shape);
            let items = chunk_grid.work_items(&region).unwrap();

            let mut covered = HashSet::new();
            for item in &items {
                assert_eq!(item.chunk_subset().shape(), item.region_subset().shape());
                assert!(item.region_subset().inbounds_shape(region.shape()));
                let chunk_origin = chunk_grid.chunk_origin(item.chunk_indices()).unwrap();
                for (chunk_indices, region_indices) in std::iter::zip(
                    item.chunk_subset().indices(),
                    item.region_subset().indices(),
                ) {
                    // Both selections refer to the same array element
                    let from_chunk: Vec<u64> = std::iter::zip(&chunk_origin, &chunk_indices)
                        .map(|(o, i)| o + i)
                        .collect();
                    let from_region: Vec<u64> = std::iter::zip(region.start(), &region_indices)
                        .map(|(o, i)| o + i)
                        .collect();
                    assert_eq!(from_chunk, from_region);
                    assert!(covered.insert(region_indices), "overlapping work items");
                }
            }
            assert_eq!(covered.len() as u64, region.num_elements());

            let chunk_indices: Vec<_> = items.iter().map(|i| i.chunk_indices().to_vec()).collect();
            assert!(chunk_indices.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(chunk_grid.work_items(&region).unwrap(), items);
        }
    }
}
