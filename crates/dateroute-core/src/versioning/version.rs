//! API version type and version bundles
//!
//! Versions are calendar dates. A [`VersionBundle`] is the full, ordered set of
//! versions a deployment supports.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// API version identified by a calendar date
///
/// Parsed from and rendered to the strict ISO form `YYYY-MM-DD`.
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(NaiveDate);

impl Version {
    /// Create a version from its date
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Create a version from year, month and day
    ///
    /// Returns `None` for dates that do not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The date this version names
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Version {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        // chrono alone accepts unpadded fields, so the shape is checked first
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !well_formed {
            return Err(VersionParseError::InvalidFormat(s.to_string()));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| VersionParseError::InvalidDate(s.to_string()))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Empty version string
    #[error("empty version string")]
    Empty,
    /// Not shaped like `YYYY-MM-DD`
    #[error("invalid version format `{0}`, expected YYYY-MM-DD")]
    InvalidFormat(String),
    /// Shaped correctly but not a real calendar date
    #[error("`{0}` is not a valid calendar date")]
    InvalidDate(String),
}

/// Error returned when a bundle cannot be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    /// A bundle needs at least one version
    #[error("a version bundle must contain at least one version")]
    Empty,
    /// The same version was given twice
    #[error("version {0} appears more than once in the bundle")]
    Duplicate(Version),
}

/// Ordered, non-empty set of supported versions
///
/// Versions are stored ascending. Built once at startup and read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBundle {
    versions: Vec<Version>,
}

impl VersionBundle {
    /// Build a bundle from versions in any order
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Result<Self, BundleError> {
        let mut versions: Vec<Version> = versions.into_iter().collect();
        if versions.is_empty() {
            return Err(BundleError::Empty);
        }

        versions.sort();
        if let Some(pair) = versions.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(BundleError::Duplicate(pair[0]));
        }

        Ok(Self { versions })
    }

    /// All versions, oldest first
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Version> {
        self.versions.iter()
    }

    /// The oldest supported version
    pub fn lowest(&self) -> Version {
        self.versions[0]
    }

    /// The newest supported version
    pub fn latest(&self) -> Version {
        self.versions[self.versions.len() - 1]
    }

    /// Number of versions in the bundle
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Check whether a version is one of the bundle's buckets
    pub fn contains(&self, version: &Version) -> bool {
        self.versions.binary_search(version).is_ok()
    }

    /// Greatest bundle version that is not after `requested`
    ///
    /// Returns `None` when `requested` predates the lowest version.
    pub fn floor(&self, requested: Version) -> Option<Version> {
        match self.versions.binary_search(&requested) {
            Ok(idx) => Some(self.versions[idx]),
            Err(0) => None,
            Err(idx) => Some(self.versions[idx - 1]),
        }
    }

    /// The version directly before `version` in the bundle, if any
    pub fn previous(&self, version: &Version) -> Option<Version> {
        let idx = self.versions.binary_search(version).ok()?;
        idx.checked_sub(1).map(|prev| self.versions[prev])
    }
}

impl<'a> IntoIterator for &'a VersionBundle {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}
