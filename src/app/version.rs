//! Release version tags
//!
//! Manifests start with a bracketed, dot-delimited tag such as `[3.1.0.7]`. Tags are
//! compared component-wise from left to right; there are no pre-release or build
//! metadata rules.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::{VersionError, VersionResult};

/// Ordered tuple of non-negative integers parsed from `[a.b.c.d]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTag(Vec<u32>);

impl VersionTag {
    /// Parse a tag, with or without the surrounding brackets
    ///
    /// # Errors
    ///
    /// Returns `VersionError::Parse` when any dot-separated token is not a
    /// non-negative integer.
    pub fn parse(text: &str) -> VersionResult<Self> {
        let raw = text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']');

        raw.split('.')
            .map(|token| token.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| VersionError::Parse {
                input: text.to_string(),
            })
    }

    /// Build a tag from explicit components
    pub fn from_parts(parts: impl Into<Vec<u32>>) -> Self {
        Self(parts.into())
    }

    /// The all-zero manifest tag used before any manifest is loaded
    pub fn zero() -> Self {
        Self(vec![0; 4])
    }

    /// Version of this crate as a three component tag
    pub fn current() -> Self {
        Self(vec![
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        ])
    }

    /// Components of the tag
    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Number of components
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Compare two tags produced by the same parser
    ///
    /// # Errors
    ///
    /// Returns `VersionError::TypeMismatch` when the tags have a different number
    /// of components, e.g. a manifest tag against a patcher tag.
    pub fn checked_cmp(&self, other: &Self) -> VersionResult<Ordering> {
        if self.arity() != other.arity() {
            return Err(VersionError::TypeMismatch {
                left: self.arity(),
                right: other.arity(),
            });
        }
        Ok(self.cmp(other))
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for VersionTag {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
