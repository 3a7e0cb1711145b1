//! Zarr fill value metadata.
//!
//! The interpretation of fill values is data type dependent, so [`FillValueMetadata`] retains the JSON form until it is resolved against a data type.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Fill value metadata.
///
/// Either a JSON boolean, a JSON number, or a JSON string (e.g. `"NaN"`, `"Infinity"`, `"-Infinity"`, `"0x..."`, `"0b..."`).
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Display, From)]
#[serde(untagged)]
pub enum FillValueMetadata {
    /// A boolean value.
    Bool(bool),
    /// A number.
    Number(serde_json::Number),
    /// A string.
    #[display("\"{_0}\"")]
    String(String),
}

impl TryFrom<&str> for FillValueMetadata {
    type Error = serde_json::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(s)
    }
}

impl From<u64> for FillValueMetadata {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for FillValueMetadata {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FillValueMetadata {
    /// Non-finite values are represented by their string form.
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or_else(
            || {
                Self::String(
                    if value.is_nan() {
                        "NaN"
                    } else if value.is_sign_positive() {
                        "Infinity"
                    } else {
                        "-Infinity"
                    }
                    .to_string(),
                )
            },
            Self::Number,
        )
    }
}

impl FillValueMetadata {
    /// Return the fill value as a boolean if it is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Return the fill value as a [`serde_json::Number`] if it is one.
    #[must_use]
    pub const fn as_number(&self) -> Option<&serde_json::Number> {
        if let Self::Number(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Return the fill value as a string if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(value) = self {
            Some(value)
        } else {
            None
        }
    }
}
