//! Zarr data types.
//!
//! Every supported data type has a fixed size in bytes.
//! Array elements are held in memory in native endianness, the `bytes` codec converts them to a stored endianness.

use derive_more::Display;
use thiserror::Error;

use zarrkit_metadata::{FillValueMetadata, MetadataV3};

use super::FillValue;

/// A data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` Boolean.
    #[display("bool")]
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    #[display("float64")]
    Float64,
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("data type {0} is unsupported")]
pub struct UnsupportedDataTypeError(String);

/// A fill value metadata incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadata);

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }
}

impl DataType {
    /// Returns the identifier of the data type.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Returns the size in bytes of an element of the data type.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Create the data type metadata.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        MetadataV3::new(self.identifier())
    }

    /// Create a data type from metadata.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the data type is not supported or has a configuration.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, UnsupportedDataTypeError> {
        if !metadata.configuration_is_none_or_empty() {
            return Err(UnsupportedDataTypeError(metadata.to_string()));
        }
        let data_type = match metadata.name() {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            name => return Err(UnsupportedDataTypeError(name.to_string())),
        };
        Ok(data_type)
    }

    /// Create a fill value from metadata.
    ///
    /// Beyond JSON booleans and numbers, the following strings are accepted:
    ///  - `"NaN"`, `"Infinity"`, and `"-Infinity"` for floating point data types,
    ///  - `"0x..."`: the raw bytes of the fill value in little endian memory order as hexadecimal,
    ///  - `"0b..."`: the fill value as a binary integer of exactly the bit width of the data type.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadata,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        let err = || IncompatibleFillValueMetadataError(self.to_string(), fill_value.clone());

        if let Some(string) = fill_value.as_str() {
            if let Some(hex) = string.strip_prefix("0x") {
                return self.fill_value_from_le_bytes(parse_hex(hex).ok_or_else(err)?).ok_or_else(err);
            }
            if let Some(binary) = string.strip_prefix("0b") {
                let bits = self.size() * 8;
                if binary.len() != bits {
                    return Err(err());
                }
                let value = u64::from_str_radix(binary, 2).map_err(|_| err())?;
                let bytes = value.to_le_bytes()[..self.size()].to_vec();
                return self.fill_value_from_le_bytes(bytes).ok_or_else(err);
            }
        }

        let fill_value = match self {
            Self::Bool => fill_value.as_bool().map(FillValue::from),
            Self::Int8 => number_as_i64(fill_value)
                .and_then(|v| i8::try_from(v).ok())
                .map(FillValue::from),
            Self::Int16 => number_as_i64(fill_value)
                .and_then(|v| i16::try_from(v).ok())
                .map(FillValue::from),
            Self::Int32 => number_as_i64(fill_value)
                .and_then(|v| i32::try_from(v).ok())
                .map(FillValue::from),
            Self::Int64 => number_as_i64(fill_value).map(FillValue::from),
            Self::UInt8 => number_as_u64(fill_value)
                .and_then(|v| u8::try_from(v).ok())
                .map(FillValue::from),
            Self::UInt16 => number_as_u64(fill_value)
                .and_then(|v| u16::try_from(v).ok())
                .map(FillValue::from),
            Self::UInt32 => number_as_u64(fill_value)
                .and_then(|v| u32::try_from(v).ok())
                .map(FillValue::from),
            Self::UInt64 => number_as_u64(fill_value).map(FillValue::from),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float32 => float_as_f64(fill_value).map(|v| FillValue::from(v as f32)),
            Self::Float64 => float_as_f64(fill_value).map(FillValue::from),
        };
        fill_value.ok_or_else(err)
    }

    /// Create fill value metadata from a fill value.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the fill value is incompatible with the data type.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<FillValueMetadata, IncompatibleFillValueError> {
        let err = || IncompatibleFillValueError::new(self.to_string(), fill_value.clone());
        let bytes = fill_value.as_ne_bytes();
        if bytes.len() != self.size() {
            return Err(err());
        }
        let metadata = match self {
            Self::Bool => match bytes[0] {
                0 => FillValueMetadata::Bool(false),
                1 => FillValueMetadata::Bool(true),
                _ => return Err(err()),
            },
            Self::Int8 => i64::from(bytemuck::pod_read_unaligned::<i8>(bytes)).into(),
            Self::Int16 => i64::from(bytemuck::pod_read_unaligned::<i16>(bytes)).into(),
            Self::Int32 => i64::from(bytemuck::pod_read_unaligned::<i32>(bytes)).into(),
            Self::Int64 => bytemuck::pod_read_unaligned::<i64>(bytes).into(),
            Self::UInt8 => u64::from(bytes[0]).into(),
            Self::UInt16 => u64::from(bytemuck::pod_read_unaligned::<u16>(bytes)).into(),
            Self::UInt32 => u64::from(bytemuck::pod_read_unaligned::<u32>(bytes)).into(),
            Self::UInt64 => bytemuck::pod_read_unaligned::<u64>(bytes).into(),
            Self::Float32 => f64::from(bytemuck::pod_read_unaligned::<f32>(bytes)).into(),
            Self::Float64 => bytemuck::pod_read_unaligned::<f64>(bytes).into(),
        };
        Ok(metadata)
    }

    /// Convert little endian `bytes` to a native endian fill value of this data type.
    fn fill_value_from_le_bytes(&self, mut bytes: Vec<u8>) -> Option<FillValue> {
        if bytes.len() != self.size() {
            return None;
        }
        if matches!(self, Self::Bool) && bytes[0] > 1 {
            return None;
        }
        if cfg!(target_endian = "big") {
            bytes.reverse();
        }
        Some(FillValue::new(bytes))
    }
}

impl TryFrom<&MetadataV3> for DataType {
    type Error = UnsupportedDataTypeError;

    fn try_from(metadata: &MetadataV3) -> Result<Self, Self::Error> {
        Self::from_metadata(metadata)
    }
}

fn number_as_i64(fill_value: &FillValueMetadata) -> Option<i64> {
    fill_value.as_number().and_then(serde_json::Number::as_i64)
}

fn number_as_u64(fill_value: &FillValueMetadata) -> Option<u64> {
    fill_value.as_number().and_then(serde_json::Number::as_u64)
}

fn float_as_f64(fill_value: &FillValueMetadata) -> Option<f64> {
    match fill_value {
        FillValueMetadata::Number(number) => number.as_f64(),
        FillValueMetadata::String(string) => match string.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        FillValueMetadata::Bool(_) => None,
    }
}

fn parse_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
