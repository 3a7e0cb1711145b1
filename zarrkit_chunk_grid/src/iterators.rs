//! Array subset iterators.
//!
//! The iterators are:
//!  - [`Indices`]: iterate over the multidimensional indices of the elements in a region.
//!  - [`ContiguousLinearisedIndices`]: iterate over contiguous sets of elements in the region with the start a linearised index.
//!
//! These can be created with the [`ArraySubset`](crate::ArraySubset) methods
//! [`indices`](crate::ArraySubset::indices) and [`contiguous_linearised_indices`](crate::ArraySubset::contiguous_linearised_indices).
//!
//! All iterators support [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]).

mod contiguous_linearised_indices_iterator;
mod indices_iterator;

pub use contiguous_linearised_indices_iterator::{
    ContiguousLinearisedIndices, ContiguousLinearisedIndicesIterator,
};
pub use indices_iterator::{Indices, IndicesIterator};
