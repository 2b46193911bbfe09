//! Date-based API versioning
//!
//! This module provides the version side of routing:
//!
//! - [`Version`]: a calendar date naming one API revision
//! - [`VersionBundle`]: the ordered set of supported versions
//! - [`VersionExtractor`]: reads the caller's token from a header or host label
//! - [`VersionResolver`]: maps the token to a bundle version (nearest-lower)
//!
//! # Example
//!
//! ```rust,ignore
//! use dateroute_core::versioning::{Version, VersionBundle, VersionResolver};
//! use std::sync::Arc;
//!
//! let bundle = VersionBundle::new([
//!     "2022-01-10".parse::<Version>()?,
//!     "2022-02-11".parse::<Version>()?,
//! ])?;
//! let resolver = VersionResolver::new(Arc::new(bundle));
//!
//! // 2022-02-01 falls between the two buckets and resolves to the older one
//! let resolution = resolver.resolve(Some("2022-02-01"), "x-api-version")?;
//! ```

mod resolver;
mod strategy;
mod version;


pub use resolver::{DefaultVersion, Resolution, VersionResolver};
pub use strategy::{ResolvedVersionToken, VersionExtractor, VersionSource, DEFAULT_VERSION_HEADER};
pub use version::{BundleError, Version, VersionBundle, VersionParseError};
