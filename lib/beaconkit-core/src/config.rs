//! Instrumentation configuration.

use beaconkit_error::{generic_error, GenericError};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Application identifier was missing or empty.
    #[snafu(display("Missing 'application_id' in configuration."))]
    MissingApplicationId,

    /// Generic configuration error.
    #[snafu(display("Failed to load configuration."))]
    Generic {
        /// Error source.
        source: GenericError,
    },
}

const fn default_server_id() -> i32 {
    1
}

const fn default_session_number() -> i32 {
    1
}

/// Configuration for one instrumented application instance.
///
/// Identity fields end up embedded in every correlation tag the session produces; the beacon endpoint is carried for
/// the transmission layer and is not consumed by the core.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InstrumentationConfig {
    /// Application identifier assigned by the backend.
    ///
    /// Must be non-empty.
    #[serde(default)]
    pub application_id: String,

    /// Unique identifier of the device the application runs on.
    #[serde(default)]
    pub device_id: i64,

    /// Identifier of the backend server instance the session reports to.
    #[serde(default = "default_server_id")]
    pub server_id: i32,

    /// Number of this session within the application instance.
    #[serde(default = "default_session_number")]
    pub session_number: i32,

    /// Endpoint URL that beacon data is transmitted to.
    #[serde(default)]
    pub beacon_endpoint: String,
}

impl InstrumentationConfig {
    /// Creates a configuration for the given application and device identifiers, with defaults for all other fields.
    pub fn new<S>(application_id: S, device_id: i64) -> Self
    where
        S: Into<String>,
    {
        Self {
            application_id: application_id.into(),
            device_id,
            server_id: default_server_id(),
            session_number: default_session_number(),
            beacon_endpoint: String::new(),
        }
    }

    /// Loads the configuration from environment variables with the given prefix, layered over defaults.
    ///
    /// Variable names follow the field names, uppercased and prefixed: with prefix `BEACONKIT_`, the application
    /// identifier is read from `BEACONKIT_APPLICATION_ID`, and so on. Fields not present in the environment take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, if the application identifier ends up missing or empty, or if a present variable
    /// cannot be deserialized into its field's type, an error is returned.
    pub fn from_environment(prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(prefix))
            .extract()
            .map_err(|e| generic_error!(e))
            .context(Generic)?;

        if config.application_id.is_empty() {
            return Err(ConfigurationError::MissingApplicationId);
        }

        Ok(config)
    }
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self::new(String::new(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigurationError, InstrumentationConfig};

    #[test]
    fn defaults() {
        let config = InstrumentationConfig::new("app-id", 42);

        assert_eq!(config.application_id, "app-id");
        assert_eq!(config.device_id, 42);
        assert_eq!(config.server_id, 1);
        assert_eq!(config.session_number, 1);
        assert!(config.beacon_endpoint.is_empty());
    }

    #[test]
    fn from_environment_rejects_empty_prefix() {
        assert!(matches!(
            InstrumentationConfig::from_environment(""),
            Err(ConfigurationError::EmptyPrefix)
        ));
    }

    #[test]
    fn from_environment_requires_application_id() {
        // Prefix chosen to match nothing in the test environment.
        assert!(matches!(
            InstrumentationConfig::from_environment("BEACONKIT_TEST_UNSET_"),
            Err(ConfigurationError::MissingApplicationId)
        ));
    }

    #[test]
    fn from_environment_applies_defaults_under_the_environment() {
        std::env::set_var("BEACONKIT_TEST_DEFAULTS_APPLICATION_ID", "app-id");

        let config = InstrumentationConfig::from_environment("BEACONKIT_TEST_DEFAULTS_").unwrap();

        assert_eq!(config.application_id, "app-id");
        assert_eq!(config.device_id, 0);
        assert_eq!(config.server_id, 1);
        assert_eq!(config.session_number, 1);
        assert!(config.beacon_endpoint.is_empty());
    }

    #[test]
    fn from_environment_reads_prefixed_variables() {
        std::env::set_var("BEACONKIT_TEST_LOAD_APPLICATION_ID", "app-id");
        std::env::set_var("BEACONKIT_TEST_LOAD_DEVICE_ID", "42");
        std::env::set_var("BEACONKIT_TEST_LOAD_BEACON_ENDPOINT", "https://collector.example.com/beacon");

        let config = InstrumentationConfig::from_environment("BEACONKIT_TEST_LOAD_").unwrap();

        assert_eq!(config.application_id, "app-id");
        assert_eq!(config.device_id, 42);
        assert_eq!(config.server_id, 1);
        assert_eq!(config.beacon_endpoint, "https://collector.example.com/beacon");
    }
}
