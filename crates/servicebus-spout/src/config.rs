//! Connector configuration.
//!
//! Spouts receive their configuration as a string key-value map, usually
//! lifted straight out of the host topology's config.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Configuration for a spout instance.
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    properties: HashMap<String, String>,
}

impl ConnectorConfig {
    /// Creates an empty config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a configuration property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Gets a configuration property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Gets a required configuration property.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingKey` if the key is not set.
    pub fn require(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.get(key)
            .ok_or_else(|| ConfigurationError::MissingKey(key.to_string()))
    }

    /// Gets a property parsed as `T`, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if the value cannot be parsed.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigurationError::InvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    })
            })
            .transpose()
    }

}
