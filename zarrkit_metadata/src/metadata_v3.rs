use derive_more::From;
use serde::{de::DeserializeOwned, ser::SerializeMap, Deserialize};
use thiserror::Error;

/// Metadata with a name and optional configuration.
///
/// Represents the data type, chunk grid, chunk key encoding, and codec fields of [`ArrayMetadataV3`](crate::ArrayMetadataV3).
///
/// Can be deserialised from a JSON string or name/configuration map.
/// For example:
/// ```json
/// "bytes"
/// ```
/// or
/// ```json
/// {
///     "name": "bytes",
/// }
/// ```
/// or
/// ```json
/// {
///     "name": "bytes",
///     "configuration": {
///       "endian": "little"
///     }
/// }
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MetadataV3 {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

/// Configuration metadata.
pub type MetadataConfiguration = serde_json::Map<String, serde_json::Value>;

impl TryFrom<&str> for MetadataV3 {
    type Error = serde_json::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(s)
    }
}

impl core::fmt::Display for MetadataV3 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(configuration) = &self.configuration {
            write!(
                f,
                "{} {}",
                self.name,
                serde_json::to_string(configuration).unwrap_or_default()
            )
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl serde::Serialize for MetadataV3 {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.configuration {
            Some(configuration) if !configuration.is_empty() => {
                let mut s = s.serialize_map(Some(2))?;
                s.serialize_entry("name", &self.name)?;
                s.serialize_entry("configuration", configuration)?;
                s.end()
            }
            Some(_) => {
                let mut s = s.serialize_map(Some(1))?;
                s.serialize_entry("name", &self.name)?;
                s.end()
            }
            None => s.serialize_str(self.name.as_str()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for MetadataV3 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct MetadataNameConfiguration {
            name: String,
            #[serde(default)]
            configuration: Option<MetadataConfiguration>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MetadataIntermediate {
            Name(String),
            NameConfiguration(MetadataNameConfiguration),
        }

        let metadata = MetadataIntermediate::deserialize(d).map_err(|_| {
            serde::de::Error::custom(r#"Expected metadata "<name>" or {"name":"<name>"} or {"name":"<name>","configuration":{}}"#)
        })?;
        match metadata {
            MetadataIntermediate::Name(name) => Ok(Self {
                name,
                configuration: None,
            }),
            // The object form keeps its form on serialization, even without a configuration
            MetadataIntermediate::NameConfiguration(metadata) => Ok(Self {
                name: metadata.name,
                configuration: Some(metadata.configuration.unwrap_or_default()),
            }),
        }
    }
}

impl MetadataV3 {
    /// Create metadata from `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            configuration: None,
        }
    }

    /// Create metadata from `name` and `configuration`.
    #[must_use]
    pub fn new_with_configuration(name: &str, configuration: MetadataConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration: Some(configuration),
        }
    }

    /// Convert a serializable configuration to [`MetadataV3`].
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if `configuration` cannot be converted to [`MetadataV3`].
    pub fn new_with_serializable_configuration<TConfiguration: serde::Serialize>(
        name: &str,
        configuration: &TConfiguration,
    ) -> Result<Self, serde_json::Error> {
        let configuration = serde_json::to_value(configuration)?;
        if let serde_json::Value::Object(configuration) = configuration {
            Ok(Self::new_with_configuration(name, configuration))
        } else {
            Err(serde::ser::Error::custom(
                "the configuration cannot be serialized to a JSON struct",
            ))
        }
    }

    /// Try and convert [`MetadataV3`] to a serializable configuration.
    ///
    /// A missing configuration is treated as an empty map.
    ///
    /// # Errors
    /// Returns a [`ConfigurationInvalidError`] if the metadata cannot be converted.
    pub fn to_configuration<TConfiguration: DeserializeOwned>(
        &self,
    ) -> Result<TConfiguration, ConfigurationInvalidError> {
        let configuration = self.configuration.clone().unwrap_or_default();
        serde_json::from_value(serde_json::Value::Object(configuration))
            .map_err(|_| ConfigurationInvalidError::new(self.name.clone(), self.configuration.clone()))
    }

    /// Returns the metadata name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metadata configuration.
    #[must_use]
    pub const fn configuration(&self) -> Option<&MetadataConfiguration> {
        self.configuration.as_ref()
    }

    /// Returns true if the configuration is none or an empty map.
    #[must_use]
    pub fn configuration_is_none_or_empty(&self) -> bool {
        self.configuration
            .as_ref()
            .is_none_or(serde_json::Map::is_empty)
    }
}

/// An invalid configuration error.
#[derive(Debug, Clone, Error, From)]
#[error("{name} is unsupported, configuration: {configuration:?}")]
pub struct ConfigurationInvalidError {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

impl ConfigurationInvalidError {
    /// Create a new invalid configuration error.
    #[must_use]
    pub fn new(name: String, configuration: Option<MetadataConfiguration>) -> Self {
        Self {
            name,
            configuration,
        }
    }

    /// Return the name of the invalid configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the underlying configuration metadata of the invalid configuration.
    #[must_use]
    pub const fn configuration(&self) -> Option<&MetadataConfiguration> {
        self.configuration.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_name_only() {
        let metadata: MetadataV3 = serde_json::from_str(r#""crc32c""#).unwrap();
        assert_eq!(metadata.name(), "crc32c");
        assert!(metadata.configuration_is_none_or_empty());
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#""crc32c""#);
    }

    #[test]
    fn metadata_name_configuration() {
        let metadata: MetadataV3 =
            r#"{"name":"gzip","configuration":{"level":1}}"#.try_into().unwrap();
        assert_eq!(metadata.name(), "gzip");
        assert_eq!(
            metadata.to_string(),
            r#"gzip {"level":1}"#
        );
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"gzip","configuration":{"level":1}}"#
        );
    }

    #[test]
    fn metadata_empty_configuration() {
        let metadata: MetadataV3 = r#"{"name":"crc32c","configuration":{}}"#.try_into().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"crc32c"}"#
        );
    }

    #[test]
    fn metadata_object_form_round_trip() {
        let metadata: MetadataV3 = r#"{"name":"crc32c"}"#.try_into().unwrap();
        assert_eq!(
            metadata,
            MetadataV3::new_with_configuration("crc32c", MetadataConfiguration::default())
        );
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"crc32c"}"#
        );
    }

    #[test]
    fn metadata_invalid() {
        assert!(MetadataV3::try_from(r#"{"name":"gzip","unknown":1}"#).is_err());
        assert!(MetadataV3::try_from("1").is_err());
    }
}
