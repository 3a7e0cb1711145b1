use std::borrow::Cow;

use super::codec::CodecError;

/// Decoded array bytes, the elements of an array or chunk in C order and native endianness.
pub type ArrayBytes<'a> = Cow<'a, [u8]>;

/// Encoded bytes, the input and output of `bytes_to_bytes` codecs.
pub type RawBytes<'a> = Cow<'a, [u8]>;

/// Validate that decoded `bytes` have the `expected` size.
///
/// # Errors
/// Returns [`CodecError::UnexpectedChunkDecodedSize`] if the sizes differ.
pub(crate) fn validate_bytes_len(bytes: &[u8], expected: u64) -> Result<(), CodecError> {
    if bytes.len() as u64 == expected {
        Ok(())
    } else {
        Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected))
    }
}

/// Convert an array shape to the shape of an [`ndarray::ArrayD`].
#[cfg(feature = "ndarray")]
pub(crate) fn ndarray_shape(shape: &[u64]) -> Option<Vec<usize>> {
    shape.iter().map(|&s| usize::try_from(s).ok()).collect()
}

/// Convert a vector of elements in C order to an [`ndarray::ArrayD`] with `shape`.
///
/// # Errors
/// Returns [`super::ArrayError::InvalidBytesInputSize`] if the number of elements does not match the shape.
#[cfg(feature = "ndarray")]
pub(crate) fn elements_to_ndarray<T>(
    shape: &[u64],
    elements: Vec<T>,
) -> Result<ndarray::ArrayD<T>, super::ArrayError> {
    let length = elements.len();
    let num_elements: u64 = shape.iter().product();
    ndarray_shape(shape)
        .and_then(|shape| ndarray::ArrayD::from_shape_vec(shape, elements).ok())
        .ok_or(super::ArrayError::InvalidBytesInputSize(length, num_elements))
}
