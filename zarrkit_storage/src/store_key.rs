use derive_more::Display;
use thiserror::Error;

use super::StorePrefix;

/// A store key.
///
/// A key is a `/` separated path to a value in a store.
/// It must not be empty and must not begin or end with `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StoreKey(String);

/// An invalid store key.
#[derive(Clone, Debug, Error)]
#[error("invalid store key {0}")]
pub struct StoreKeyError(String);

/// A list of [`StoreKey`].
pub type StoreKeys = Vec<StoreKey>;

impl StoreKey {
    /// Create a new store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid according to [`StoreKey::validate()`].
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// Create a store key by appending the relative key `name` to `prefix`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if the resulting key is invalid.
    pub fn new_with_prefix(prefix: &StorePrefix, name: &str) -> Result<Self, StoreKeyError> {
        Self::new(format!("{}{name}", prefix.as_str()))
    }

    /// Extracts a string slice of the underlying key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a key.
    ///
    /// A key is valid if it is non-empty and neither starts nor ends with a `/` character.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty() && !key.starts_with('/') && !key.ends_with('/')
    }

    /// Returns true if the key has prefix `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &StorePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// Returns the remainder of the key after `prefix`, if the key has that prefix.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &StorePrefix) -> Option<&str> {
        self.0.strip_prefix(prefix.as_str())
    }

    /// Convert to a [`StorePrefix`] (the key with a trailing `/`).
    #[must_use]
    pub fn to_prefix(&self) -> StorePrefix {
        StorePrefix::new_for_key(&self.0)
    }

    /// Returns the parent of this key.
    #[must_use]
    pub fn parent(&self) -> StorePrefix {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => StorePrefix::new_for_key(parent),
            None => StorePrefix::root(),
        }
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}
