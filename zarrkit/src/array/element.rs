//! Array elements.
//!
//! An [`Element`] is a Rust type that can be stored in or retrieved from an array with a compatible [`DataType`].

use super::{ArrayError, DataType};

/// A trait for types that are compatible with a [`DataType`].
pub trait Element: Sized + Copy + Send + Sync + 'static {
    /// The data type matching this element type.
    const DATA_TYPE: DataType;

    /// Validate the data type.
    ///
    /// # Errors
    /// Returns an [`ArrayError::IncompatibleElementType`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: &DataType) -> Result<(), ArrayError> {
        if *data_type == Self::DATA_TYPE {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementType(
                Self::DATA_TYPE,
                *data_type,
            ))
        }
    }

    /// Convert a slice of elements to native endian bytes.
    fn into_bytes(elements: &[Self]) -> Vec<u8>;

    /// Convert native endian bytes to a vector of elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the number of bytes is not a multiple of the element size or the bytes are not valid elements.
    fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, ArrayError>;
}

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn into_bytes(elements: &[Self]) -> Vec<u8> {
        bytemuck::cast_slice(elements).to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
        let elements: &[bool] = bytemuck::checked::try_cast_slice(bytes)
            .map_err(|_| ArrayError::InvalidElementValue)?;
        Ok(elements.to_vec())
    }
}

macro_rules! impl_element_pod {
    ($t:ty, $data_type:expr) => {
        impl Element for $t {
            const DATA_TYPE: DataType = $data_type;

            fn into_bytes(elements: &[Self]) -> Vec<u8> {
                bytemuck::cast_slice(elements).to_vec()
            }

            fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
                let size = core::mem::size_of::<$t>();
                if bytes.len() % size == 0 {
                    Ok(bytemuck::pod_collect_to_vec(bytes))
                } else {
                    Err(ArrayError::InvalidBytesInputSize(
                        bytes.len(),
                        (bytes.len() / size * size) as u64,
                    ))
                }
            }
        }
    };
}

impl_element_pod!(i8, DataType::Int8);
impl_element_pod!(i16, DataType::Int16);
impl_element_pod!(i32, DataType::Int32);
impl_element_pod!(i64, DataType::Int64);
impl_element_pod!(u8, DataType::UInt8);
impl_element_pod!(u16, DataType::UInt16);
impl_element_pod!(u32, DataType::UInt32);
impl_element_pod!(u64, DataType::UInt64);
impl_element_pod!(f32, DataType::Float32);
impl_element_pod!(f64, DataType::Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_round_trip() {
        let elements = [1.5f32, -2.0, 3.25];
        let bytes = f32::into_bytes(&elements);
        assert_eq!(bytes.len(), 12);
        assert_eq!(f32::from_bytes(&bytes).unwrap(), elements);
        assert!(f32::from_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn element_bool() {
        assert_eq!(bool::into_bytes(&[true, false]), vec![1, 0]);
        assert_eq!(bool::from_bytes(&[0, 1]).unwrap(), vec![false, true]);
        assert!(matches!(
            bool::from_bytes(&[2]),
            Err(ArrayError::InvalidElementValue)
        ));
    }

    #[test]
    fn element_data_type() {
        assert!(u16::validate_data_type(&DataType::UInt16).is_ok());
        assert!(matches!(
            u16::validate_data_type(&DataType::Int16),
            Err(ArrayError::IncompatibleElementType(
                DataType::UInt16,
                DataType::Int16
            ))
        ));
    }
}
