//! Version token extraction
//!
//! Finds the raw version token a caller sent, either in a header or in one
//! label of the `Host` header. Parsing happens later in the resolver so the
//! field name travels with the token for error reporting.

use http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Default header carrying the requested version
pub const DEFAULT_VERSION_HEADER: &str = "x-api-version";

/// Where the version token is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionSource {
    /// Read from an HTTP header
    ///
    /// Example: `X-API-VERSION: 2022-02-11`
    Header {
        /// Header name (matched case-insensitively)
        name: String,
    },

    /// Read from one dot-separated label of the `Host` header
    ///
    /// Example: with `index = 0`, `2022-02-11.api.example.com` yields
    /// `2022-02-11`.
    HostLabel {
        /// Zero-based label position
        index: usize,
    },
}

impl VersionSource {
    /// Header-based source using `X-API-VERSION`
    pub fn header() -> Self {
        Self::Header {
            name: DEFAULT_VERSION_HEADER.to_string(),
        }
    }

    /// Header-based source with a custom header name
    pub fn header_with_name(name: impl Into<String>) -> Self {
        Self::Header { name: name.into() }
    }

    /// Host-label source
    pub fn host_label(index: usize) -> Self {
        Self::HostLabel { index }
    }

    /// Field name reported when the token is invalid
    ///
    /// Header names are reported lowercased; host labels report `host`.
    pub fn field_name(&self) -> String {
        match self {
            Self::Header { name } => name.to_ascii_lowercase(),
            Self::HostLabel { .. } => header::HOST.as_str().to_string(),
        }
    }
}

impl Default for VersionSource {
    fn default() -> Self {
        Self::header()
    }
}

/// Raw token pulled from a request, tagged with the field it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersionToken {
    /// Field the token was read from (lowercased header name or `host`)
    pub field: String,
    /// The token itself, `None` when the caller did not send one
    pub raw: Option<String>,
}

impl ResolvedVersionToken {
    /// Borrow the raw token
    pub fn as_deref(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

/// Extracts version tokens according to a [`VersionSource`]
#[derive(Debug, Clone, Default)]
pub struct VersionExtractor {
    source: VersionSource,
}

impl VersionExtractor {
    /// Create an extractor reading the default header
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor for a specific source
    pub fn with_source(source: VersionSource) -> Self {
        Self { source }
    }

    /// The configured source
    pub fn source(&self) -> &VersionSource {
        &self.source
    }

    /// Extract the token from request headers
    ///
    /// Header values are trimmed; values that are not visible ASCII are kept
    /// as-is (lossily) so the resolver can reject them with the field name.
    pub fn extract(&self, headers: &HeaderMap) -> ResolvedVersionToken {
        let raw = match &self.source {
            VersionSource::Header { name } => headers
                .get(name.as_str())
                .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string()),
            VersionSource::HostLabel { index } => headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .and_then(|host| Self::host_label(host, *index)),
        };

        ResolvedVersionToken {
            field: self.source.field_name(),
            raw,
        }
    }

    /// Pick label `index` out of a host, ignoring any port
    fn host_label(host: &str, index: usize) -> Option<String> {
        let host = host.rsplit_once(':').map_or(host, |(name, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) {
                name
            } else {
                host
            }
        });

        host.split('.')
            .nth(index)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
    }
}
