use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ArrayShape, DimensionName, FillValueMetadata, MetadataV3};

/// Zarr array metadata (storage specification v3).
///
/// An example `JSON` document for a Zarr V3 array:
/// ```json
/// {
///     "zarr_format": 3,
///     "node_type": "array",
///     "shape": [10000, 1000],
///     "dimension_names": ["rows", "columns"],
///     "data_type": "float64",
///     "chunk_grid": {
///         "name": "regular",
///         "configuration": {
///             "chunk_shape": [1000, 100]
///         }
///     },
///     "chunk_key_encoding": {
///         "name": "default",
///         "configuration": {
///             "separator": "/"
///         }
///     },
///     "codecs": [{
///         "name": "bytes",
///         "configuration": {
///             "endian": "little"
///         }
///     }, {
///         "name": "gzip",
///         "configuration": {
///             "level": 1
///         }
///     }],
///     "fill_value": "NaN",
///     "attributes": {
///         "foo": 42,
///         "bar": "apples",
///         "baz": [1, 2, 3, 4]
///     }
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV3 {
    /// An integer defining the version of the storage specification to which the array adheres. Must be `3`.
    pub zarr_format: monostate::MustBe!(3u64),
    /// A string defining the type of hierarchy node element, must be `array` here.
    pub node_type: monostate::MustBe!("array"),
    /// An array of integers providing the length of each dimension of the Zarr array.
    pub shape: ArrayShape,
    /// The data type of the Zarr array.
    pub data_type: MetadataV3,
    /// The chunk grid of the Zarr array.
    pub chunk_grid: MetadataV3,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    pub chunk_key_encoding: MetadataV3,
    /// Provides an element value to use for uninitialised portions of the Zarr array.
    pub fill_value: FillValueMetadata,
    /// Specifies a list of codecs to be used for encoding and decoding chunks.
    pub codecs: Vec<MetadataV3>,
    /// Optional user defined attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// An optional list of storage transformers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_transformers: Vec<MetadataV3>,
    /// An optional list of dimension names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<DimensionName>>,
    /// Additional fields.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

/// Additional fields in array metadata.
///
/// Each must be an object with a `"must_understand": false` field to be accepted.
pub type AdditionalFields = serde_json::Map<String, serde_json::Value>;

/// An unsupported additional field error.
///
/// An unsupported field in array metadata is an unrecognised field without `"must_understand": false`.
#[derive(Clone, Debug, Error)]
#[error("unsupported additional field {name} with value {value}")]
pub struct UnsupportedAdditionalFieldError {
    name: String,
    value: serde_json::Value,
}

impl UnsupportedAdditionalFieldError {
    /// Return the name of the unsupported additional field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the value of the unsupported additional field.
    #[must_use]
    pub const fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl ArrayMetadataV3 {
    /// Create new array metadata.
    ///
    /// Attributes, storage transformers, dimension names, and additional fields are empty.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: MetadataV3,
        chunk_grid: MetadataV3,
        chunk_key_encoding: MetadataV3,
        fill_value: FillValueMetadata,
        codecs: Vec<MetadataV3>,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(3u64),
            node_type: monostate::MustBe!("array"),
            shape,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            attributes: serde_json::Map::default(),
            storage_transformers: Vec::default(),
            dimension_names: None,
            additional_fields: AdditionalFields::default(),
        }
    }

    /// Set the user defined attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the dimension names.
    #[must_use]
    pub fn with_dimension_names(mut self, dimension_names: Option<Vec<DimensionName>>) -> Self {
        self.dimension_names = dimension_names;
        self
    }

    /// Check that every additional field has `"must_understand": false`.
    ///
    /// # Errors
    /// Returns [`UnsupportedAdditionalFieldError`] for the first field that must be understood.
    pub fn validate_additional_fields(&self) -> Result<(), UnsupportedAdditionalFieldError> {
        for (name, value) in &self.additional_fields {
            let must_understand = value
                .as_object()
                .and_then(|object| object.get("must_understand"))
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(true);
            if must_understand {
                return Err(UnsupportedAdditionalFieldError {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}
