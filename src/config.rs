//! Strongly-typed configuration for the action-listing pipeline.
//!
//! Values can be constructed from defaults, loaded from environment variables
//! (with optional `.env` support), or merged with explicit overrides for
//! programmatic updates.

use std::env;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use dotenvy::dotenv;
use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};
use serde::{Deserialize as DeriveDeserialize, Serialize as DeriveSerialize};
use thiserror::Error;

use crate::logging::LogCallback;

/// Default chat model used for action listing.
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o";

/// Default number of attempts made by the retry wrapper.
pub const DEFAULT_MAX_TRIES: usize = 3;

/// Verbosity level for pipeline logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Minimal,
    #[default]
    Medium,
    Detailed,
}

impl Verbosity {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Verbosity::Minimal => 0,
            Verbosity::Medium => 1,
            Verbosity::Detailed => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Verbosity::Minimal),
            1 => Some(Verbosity::Medium),
            2 => Some(Verbosity::Detailed),
            _ => None,
        }
    }
}

impl Serialize for Verbosity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Verbosity::from_u8(value).ok_or_else(|| {
            DeError::custom(format!(
                "invalid verbosity value {value}; expected 0, 1, or 2"
            ))
        })
    }
}

/// Configuration values for the listing pipeline and its default model service.
#[derive(DeriveSerialize, DeriveDeserialize, Clone)]
#[serde(default)]
pub struct ListingConfig {
    #[serde(alias = "modelName")]
    pub model_name: String,
    #[serde(alias = "modelApiKey")]
    pub model_api_key: Option<String>,
    #[serde(alias = "apiBase")]
    pub api_base: Option<String>,
    pub temperature: Option<f32>,
    #[serde(alias = "maxTokens")]
    pub max_tokens: Option<u32>,
    #[serde(alias = "maxTries")]
    pub max_tries: usize,
    pub verbose: Verbosity,
    #[serde(skip_serializing, skip_deserializing)]
    pub external_logger: Option<LogCallback>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        ListingConfig {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_api_key: None,
            api_base: None,
            temperature: None,
            max_tokens: None,
            max_tries: DEFAULT_MAX_TRIES,
            verbose: Verbosity::default(),
            external_logger: None,
        }
    }
}

impl ListingConfig {
    /// Construct a configuration by reading relevant environment variables, after
    /// loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ListingConfigError> {
        let _ = dotenv();
        let mut config = ListingConfig::default();

        if let Some(value) = env_var("MODEL_NAME") {
            config.model_name = value;
        }

        if let Some(value) = env_var("MODEL_API_KEY") {
            config.model_api_key = Some(value);
        }

        if let Some(value) = env_var("MODEL_API_BASE") {
            config.api_base = Some(value);
        }

        if let Some(value) = env_var("LISTING_TEMPERATURE") {
            config.temperature = Some(parse_f32("LISTING_TEMPERATURE", &value)?);
        }

        if let Some(value) = env_var("LISTING_MAX_TOKENS") {
            let parsed = parse_u64("LISTING_MAX_TOKENS", &value)?;
            config.max_tokens = Some(u32::try_from(parsed).map_err(|_| {
                ListingConfigError::OutOfRange {
                    field: "LISTING_MAX_TOKENS",
                    value: value.clone(),
                }
            })?);
        }

        if let Some(value) = env_var("LISTING_MAX_TRIES") {
            let parsed = parse_u64("LISTING_MAX_TRIES", &value)?;
            if parsed == 0 {
                return Err(ListingConfigError::OutOfRange {
                    field: "LISTING_MAX_TRIES",
                    value,
                });
            }
            config.max_tries = parsed as usize;
        }

        if let Some(value) = env_var("LISTING_VERBOSE") {
            let parsed = parse_u64("LISTING_VERBOSE", &value)?;
            config.verbose = u8::try_from(parsed)
                .ok()
                .and_then(Verbosity::from_u8)
                .ok_or_else(|| ListingConfigError::invalid_enum("LISTING_VERBOSE", value))?;
        }

        Ok(config)
    }

    /// Create a new configuration with explicit field overrides applied.
    pub fn with_overrides(&self, overrides: ListingConfigOverrides) -> ListingConfig {
        let mut next = self.clone();

        if let Some(value) = overrides.model_name {
            next.model_name = value;
        }
        if let Some(value) = overrides.model_api_key {
            next.model_api_key = value;
        }
        if let Some(value) = overrides.api_base {
            next.api_base = value;
        }
        if let Some(value) = overrides.temperature {
            next.temperature = value;
        }
        if let Some(value) = overrides.max_tokens {
            next.max_tokens = value;
        }
        if let Some(value) = overrides.max_tries {
            next.max_tries = value.max(1);
        }
        if let Some(value) = overrides.verbose {
            next.verbose = value;
        }
        if let Some(value) = overrides.external_logger {
            next.external_logger = value;
        }

        next
    }
}

/// Field-level overrides for [`ListingConfig::with_overrides`].
#[derive(Default, Clone)]
pub struct ListingConfigOverrides {
    pub model_name: Option<String>,
    pub model_api_key: Option<Option<String>>,
    pub api_base: Option<Option<String>>,
    pub temperature: Option<Option<f32>>,
    pub max_tokens: Option<Option<u32>>,
    pub max_tries: Option<usize>,
    pub verbose: Option<Verbosity>,
    pub external_logger: Option<Option<LogCallback>>,
}

impl fmt::Debug for ListingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingConfig")
            .field("model_name", &self.model_name)
            .field(
                "model_api_key",
                &self.model_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_tries", &self.max_tries)
            .field("verbose", &self.verbose)
            .field("external_logger", &self.external_logger.is_some())
            .finish()
    }
}

impl fmt::Debug for ListingConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingConfigOverrides")
            .field("model_name", &self.model_name)
            .field(
                "model_api_key",
                &self
                    .model_api_key
                    .as_ref()
                    .map(|inner| inner.as_ref().map(|_| "<redacted>")),
            )
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_tries", &self.max_tries)
            .field("verbose", &self.verbose)
            .field(
                "external_logger",
                &self.external_logger.as_ref().map(|inner| inner.is_some()),
            )
            .finish()
    }
}

impl ListingConfigOverrides {
    /// Builder-style helper to set the `model_name` override.
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Builder-style helper to set the `model_api_key` override.
    pub fn model_api_key<T: Into<Option<String>>>(mut self, api_key: T) -> Self {
        self.model_api_key = Some(api_key.into());
        self
    }

    /// Builder-style helper to set the `max_tries` override.
    pub fn max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = Some(max_tries);
        self
    }
}

/// Errors that can arise while constructing a [`ListingConfig`].
#[derive(Debug, Error)]
pub enum ListingConfigError {
    #[error("invalid value '{value}' for {field}")]
    InvalidEnumVariant { field: &'static str, value: String },
    #[error("value '{value}' for {field} is out of range")]
    OutOfRange { field: &'static str, value: String },
    #[error("invalid number '{value}' for {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid float '{value}' for {field}: {source}")]
    InvalidFloat {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

impl ListingConfigError {
    fn invalid_enum(field: &'static str, value: String) -> Self {
        ListingConfigError::InvalidEnumVariant { field, value }
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ListingConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| ListingConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_f32(field: &'static str, value: &str) -> Result<f32, ListingConfigError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|source| ListingConfigError::InvalidFloat {
            field,
            value: value.to_string(),
            source,
        })
}
