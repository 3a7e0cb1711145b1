//! The `transpose` array to array codec.
//!
//! Permutes the dimensions of arrays.
//!
//! ### Specification
//! - <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/transpose/index.html>
//!
//! ### Codec `configuration` Example - [`TransposeCodecConfiguration`]:
//! ```rust
//! # let JSON = r#"
//! {
//!     "order": [2, 1, 0]
//! }
//! # "#;
//! # use zarrkit::metadata::codec::transpose::TransposeCodecConfiguration;
//! # let configuration: TransposeCodecConfiguration = serde_json::from_str(JSON).unwrap();
//! ```

mod transpose_codec;

pub use transpose_codec::TransposeCodec;
pub use zarrkit_metadata::codec::transpose::{
    TransposeCodecConfiguration, TransposeCodecConfigurationV1, TransposeOrder,
};

use super::super::CodecError;

/// Permute the bytes of an array with `untransposed_shape` and elements of `bytes_per_element` into `transpose_order`.
fn transpose_array(
    transpose_order: &[usize],
    untransposed_shape: &[u64],
    bytes_per_element: usize,
    data: &[u8],
) -> Result<Vec<u8>, CodecError> {
    // The element bytes form a trailing axis which stays in place
    let mut shape = Vec::with_capacity(untransposed_shape.len() + 1);
    for &size in untransposed_shape {
        shape.push(usize::try_from(size).map_err(|_| CodecError::from("chunk shape exceeds usize"))?);
    }
    shape.push(bytes_per_element);
    let mut order = Vec::with_capacity(transpose_order.len() + 1);
    order.extend_from_slice(transpose_order);
    order.push(transpose_order.len());

    let array = ndarray::ArrayViewD::<u8>::from_shape(shape, data)
        .map_err(|err| CodecError::Other(err.to_string()))?;
    Ok(array.permuted_axes(order).iter().copied().collect())
}

fn permute<T: Copy>(v: &[T], order: &[usize]) -> Option<Vec<T>> {
    if v.len() == order.len() {
        Some(order.iter().map(|&axis| v[axis]).collect())
    } else {
        None
    }
}
