//! Routing configuration with environment variable support
//!
//! Every field can be set through a `DATEROUTE_`-prefixed variable:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `DATEROUTE_VERSION_HEADER` | header name | `x-api-version` |
//! | `DATEROUTE_VERSION_SOURCE` | `header`, `host` | `header` |
//! | `DATEROUTE_HOST_LABEL_INDEX` | label position | `0` |
//! | `DATEROUTE_DEFAULT_VERSION` | `latest`, `lowest`, `required`, `YYYY-MM-DD` | `latest` |
//! | `DATEROUTE_ECHO_VERSION_HEADER` | `true`, `false` | `false` |
//!
//! ```ignore
//! use dateroute_core::config::{load_dotenv, RoutingConfig};
//!
//! load_dotenv();
//! let config = RoutingConfig::from_env()?;
//! ```

use crate::versioning::{DefaultVersion, VersionSource, DEFAULT_VERSION_HEADER};
use serde::Deserialize;
use thiserror::Error;

/// Prefix of every configuration variable
pub const ENV_PREFIX: &str = "DATEROUTE_";

/// Error type for configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),
}

/// Which kind of [`VersionSource`] to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Header,
    Host,
}

/// How versions are read and defaulted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Header carrying the version when `version_source` is `header`
    pub version_header: String,
    pub version_source: SourceKind,
    /// Host label position when `version_source` is `host`
    pub host_label_index: usize,
    /// Policy for requests that send no version
    pub default_version: DefaultVersion,
    /// Echo the serving version back in `version_header`
    pub echo_version_header: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            version_header: DEFAULT_VERSION_HEADER.to_string(),
            version_source: SourceKind::Header,
            host_label_index: 0,
            default_version: DefaultVersion::Latest,
            echo_version_header: false,
        }
    }
}

impl RoutingConfig {
    /// Read `DATEROUTE_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    /// Read `DATEROUTE_*` entries from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    /// The token source this configuration describes
    pub fn version_source(&self) -> VersionSource {
        match self.version_source {
            SourceKind::Header => VersionSource::header_with_name(self.version_header.clone()),
            SourceKind::Host => VersionSource::host_label(self.host_label_index),
        }
    }

    pub fn with_version_header(mut self, name: impl Into<String>) -> Self {
        self.version_header = name.into();
        self.version_source = SourceKind::Header;
        self
    }

    pub fn with_host_label(mut self, index: usize) -> Self {
        self.version_source = SourceKind::Host;
        self.host_label_index = index;
        self
    }

    pub fn with_default_version(mut self, default: DefaultVersion) -> Self {
        self.default_version = default;
        self
    }

    pub fn with_echo_version_header(mut self, echo: bool) -> Self {
        self.echo_version_header = echo;
        self
    }
}

/// Load a `.env` file from the current directory or its parents
///
/// A missing file is not an error.
pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        tracing::trace!(error = %err, "No .env file loaded");
    }
}

/// Load a specific `.env` file
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    if let Err(err) = dotenvy::from_path(path.as_ref()) {
        tracing::debug!(path = %path.as_ref().display(), error = %err, "Failed to load env file");
    }
}
