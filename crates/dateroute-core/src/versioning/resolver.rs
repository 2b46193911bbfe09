//! Version resolution
//!
//! Maps a caller's version token onto one of the bundle's versions.

use super::strategy::ResolvedVersionToken;
use super::version::{Version, VersionBundle, VersionParseError};
use crate::error::RoutingError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What to do when a request carries no version token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultVersion {
    /// Serve the newest version
    #[default]
    Latest,
    /// Serve the oldest version
    Lowest,
    /// Behave as if the caller had sent this date
    Fixed(Version),
    /// Reject the request with a validation error
    Required,
}

impl fmt::Display for DefaultVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Lowest => f.write_str("lowest"),
            Self::Fixed(version) => write!(f, "{}", version),
            Self::Required => f.write_str("required"),
        }
    }
}

impl FromStr for DefaultVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "newest" => Ok(Self::Latest),
            "lowest" | "oldest" => Ok(Self::Lowest),
            "required" | "none" => Ok(Self::Required),
            other => other.parse().map(Self::Fixed),
        }
    }
}

impl Serialize for DefaultVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DefaultVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of resolving a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A bundle version serves the request
    Matched {
        /// The bundle version chosen
        version: Version,
        /// The date the caller asked for, `None` when the default applied
        requested: Option<Version>,
    },
    /// The caller asked for a date before the oldest supported version
    BelowRange {
        /// The date the caller asked for
        requested: Version,
    },
}

impl Resolution {
    /// The bundle version, if any
    pub fn version(&self) -> Option<Version> {
        match self {
            Self::Matched { version, .. } => Some(*version),
            Self::BelowRange { .. } => None,
        }
    }

    /// Whether the caller's date named a bundle version exactly
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Matched { version, requested: Some(requested) } if version == requested)
    }
}

/// Resolves version tokens against a bundle
///
/// Resolution is the nearest-lower rule: the greatest bundle version not
/// after the requested date.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    bundle: Arc<VersionBundle>,
    default: DefaultVersion,
}

impl VersionResolver {
    /// Create a resolver that falls back to the latest version
    pub fn new(bundle: Arc<VersionBundle>) -> Self {
        Self {
            bundle,
            default: DefaultVersion::Latest,
        }
    }

    /// Set the policy for requests without a token
    pub fn default_version(mut self, default: DefaultVersion) -> Self {
        self.default = default;
        self
    }

    /// The bundle this resolver maps onto
    pub fn bundle(&self) -> &Arc<VersionBundle> {
        &self.bundle
    }

    /// The policy for absent tokens
    pub fn default_policy(&self) -> DefaultVersion {
        self.default
    }

    /// Resolve a raw token read from `field`
    pub fn resolve(&self, raw: Option<&str>, field: &str) -> Result<Resolution, RoutingError> {
        let Some(raw) = raw else {
            return self.resolve_absent(field);
        };

        let requested: Version = raw.parse().map_err(|err: VersionParseError| {
            RoutingError::InvalidVersion {
                field: field.to_string(),
                value: raw.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok(self.resolve_date(requested, Some(requested)))
    }

    /// Resolve a token produced by a [`VersionExtractor`](super::VersionExtractor)
    pub fn resolve_token(&self, token: &ResolvedVersionToken) -> Result<Resolution, RoutingError> {
        self.resolve(token.as_deref(), &token.field)
    }

    fn resolve_absent(&self, field: &str) -> Result<Resolution, RoutingError> {
        match self.default {
            DefaultVersion::Latest => Ok(Resolution::Matched {
                version: self.bundle.latest(),
                requested: None,
            }),
            DefaultVersion::Lowest => Ok(Resolution::Matched {
                version: self.bundle.lowest(),
                requested: None,
            }),
            DefaultVersion::Fixed(date) => Ok(self.resolve_date(date, None)),
            DefaultVersion::Required => Err(RoutingError::MissingVersion {
                field: field.to_string(),
            }),
        }
    }

    fn resolve_date(&self, date: Version, requested: Option<Version>) -> Resolution {
        match self.bundle.floor(date) {
            Some(version) => Resolution::Matched { version, requested },
            None => Resolution::BelowRange { requested: date },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn resolver() -> VersionResolver {
        let bundle =
            VersionBundle::new([v("2022-01-10"), v("2022-02-11"), v("2022-03-12")]).unwrap();
        VersionResolver::new(Arc::new(bundle))
    }

    #[test]
    fn test_exact_match() {
        let resolution = resolver().resolve(Some("2022-02-11"), "x-api-version").unwrap();
        assert_eq!(resolution.version(), Some(v("2022-02-11")));
        assert!(resolution.is_exact());
    }

    #[test]
    fn test_nearest_lower() {
        let resolver = resolver();

        let between = resolver.resolve(Some("2022-02-28"), "x-api-version").unwrap();
        assert_eq!(between.version(), Some(v("2022-02-11")));
        assert!(!between.is_exact());

        let future = resolver.resolve(Some("2025-01-01"), "x-api-version").unwrap();
        assert_eq!(future.version(), Some(v("2022-03-12")));
    }

    #[test]
    fn test_below_range() {
        let resolution = resolver().resolve(Some("1993-11-15"), "x-api-version").unwrap();
        assert_eq!(
            resolution,
            Resolution::BelowRange {
                requested: v("1993-11-15")
            }
        );
        assert_eq!(resolution.version(), None);
    }

    #[test]
    fn test_malformed_token_names_field() {
        let err = resolver().resolve(Some("2025-40-01"), "x-api-version").unwrap_err();
        match err {
            RoutingError::InvalidVersion { field, value, .. } => {
                assert_eq!(field, "x-api-version");
                assert_eq!(value, "2025-40-01");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_absent_token_policies() {
        let latest = resolver().resolve(None, "x-api-version").unwrap();
        assert_eq!(latest.version(), Some(v("2022-03-12")));
        assert!(!latest.is_exact());

        let lowest = resolver()
            .default_version(DefaultVersion::Lowest)
            .resolve(None, "x-api-version")
            .unwrap();
        assert_eq!(lowest.version(), Some(v("2022-01-10")));

        let fixed = resolver()
            .default_version(DefaultVersion::Fixed(v("2022-02-20")))
            .resolve(None, "x-api-version")
            .unwrap();
        assert_eq!(fixed.version(), Some(v("2022-02-11")));

        let required = resolver()
            .default_version(DefaultVersion::Required)
            .resolve(None, "x-api-version");
        assert!(matches!(required, Err(RoutingError::MissingVersion { .. })));
    }

    #[test]
    fn test_default_version_from_str() {
        assert_eq!("latest".parse::<DefaultVersion>().unwrap(), DefaultVersion::Latest);
        assert_eq!("Lowest".parse::<DefaultVersion>().unwrap(), DefaultVersion::Lowest);
        assert_eq!("required".parse::<DefaultVersion>().unwrap(), DefaultVersion::Required);
        assert_eq!(
            "2022-02-11".parse::<DefaultVersion>().unwrap(),
            DefaultVersion::Fixed(v("2022-02-11"))
        );
        assert!("yesterday".parse::<DefaultVersion>().is_err());
    }
}
