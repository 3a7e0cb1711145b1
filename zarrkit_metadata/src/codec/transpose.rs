//! The `transpose` codec metadata.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The identifier for the `transpose` codec.
pub const IDENTIFIER: &str = "transpose";

/// A wrapper to handle various versions of Transpose codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum TransposeCodecConfiguration {
    /// Version 1.0.
    V1(TransposeCodecConfigurationV1),
}

/// Configuration parameters for the Transpose codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct TransposeCodecConfigurationV1 {
    /// The transpose order defining how to permute the array.
    pub order: TransposeOrder,
}

impl TransposeCodecConfigurationV1 {
    /// Create a new Transpose codec configuration given a [`TransposeOrder`].
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }
}

/// The transpose order defining how to permute the array.
///
/// An array of integers specifying a permutation of 0, 1, …, n-1, where n is the number of dimensions in the decoded chunk representation provided as input to this codec.
#[derive(Serialize, Clone, Eq, PartialEq, Debug)]
pub struct TransposeOrder(pub Vec<usize>);

/// An invalid permutation order error.
#[derive(Clone, Debug, Error, From)]
#[error("permutation order {0:?} is invalid. It must be an array of integers specifying a permutation of 0, 1, …, n-1, where n is the number of dimensions")]
pub struct InvalidPermutationError(Vec<usize>);

impl TransposeOrder {
    /// Create a new [`TransposeOrder`].
    ///
    /// # Errors
    /// Returns [`InvalidPermutationError`] if the permutation order is invalid.
    pub fn new(order: &[usize]) -> Result<Self, InvalidPermutationError> {
        if validate_permutation(order) {
            Ok(Self(order.to_vec()))
        } else {
            Err(InvalidPermutationError::from(order.to_vec()))
        }
    }

    /// Return the inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut inverse = vec![0; self.0.len()];
        for (i, &axis) in self.0.iter().enumerate() {
            inverse[axis] = i;
        }
        Self(inverse)
    }
}

impl<'de> serde::Deserialize<'de> for TransposeOrder {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let permutation = Vec::<usize>::deserialize(d)?;
        if validate_permutation(&permutation) {
            Ok(Self(permutation))
        } else {
            Err(serde::de::Error::custom(
                "transpose order must be an array of integers specifying a permutation of 0, 1, …, n-1, where n is the number of dimensions",
            ))
        }
    }
}

fn validate_permutation(permutation: &[usize]) -> bool {
    let mut seen = vec![false; permutation.len()];
    for &axis in permutation {
        match seen.get_mut(axis) {
            Some(seen) if !*seen => *seen = true,
            _ => return false,
        }
    }
    !permutation.is_empty()
}
