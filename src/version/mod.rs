// src/version/mod.rs

//! Version handling and constraint satisfaction for package selection
//!
//! Source package versions use the `[epoch:]version[-revision]` format:
//! epoch overrides ordinary ordering, revision tracks repeated builds of
//! the same upstream version. Constraints are the operators the spec
//! subset allows (`=`, `>=`, `<=`, `>`, `<`, `~`).

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed package version with epoch, version, and revision components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageVersion {
    pub epoch: u64,
    pub version: String,
    pub revision: Option<String>,
}

impl PackageVersion {
    /// Parse a version string
    ///
    /// Format: [epoch:]version[-revision]
    /// Examples:
    /// - "8.2.1" → epoch=0, version="8.2.1", revision=None
    /// - "1:8.2.1" → epoch=1, version="8.2.1", revision=None
    /// - "8.2.1-r3" → epoch=0, version="8.2.1", revision=Some("r3")
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch_str, rest) = if let Some(colon_pos) = s.find(':') {
            let (e, r) = s.split_at(colon_pos);
            (e, &r[1..])
        } else {
            ("0", s)
        };

        let epoch = if epoch_str.is_empty() {
            0
        } else {
            epoch_str.parse::<u64>().map_err(|e| Error::Version {
                version: s.to_string(),
                reason: format!("bad epoch: {}", e),
            })?
        };

        let (version, revision) = if let Some(dash_pos) = rest.rfind("-r") {
            let (v, r) = rest.split_at(dash_pos);
            (v.to_string(), Some(r[1..].to_string()))
        } else {
            (rest.to_string(), None)
        };

        if version.is_empty() {
            return Err(Error::Version {
                version: s.to_string(),
                reason: "empty version component".to_string(),
            });
        }

        Ok(Self {
            epoch,
            version,
            revision,
        })
    }

    /// Convert to a semver::Version for comparison
    ///
    /// Package versions may not be semver-compliant, so we normalize:
    /// extract major.minor.patch from the leading numeric components.
    fn to_semver(&self) -> Version {
        if let Ok(v) = Version::parse(&self.version) {
            return v;
        }

        let parts: Vec<&str> = self.version.split('.').collect();
        let major = parts
            .first()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let minor = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
        let patch = parts.get(2).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);

        Version::new(major, minor, patch)
    }

    /// Compare two package versions
    pub fn compare(&self, other: &PackageVersion) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match self.to_semver().cmp(&other.to_semver()) {
            Ordering::Equal => {
                // Semver normalization can collapse distinct strings;
                // break the tie on the raw version text
                match self.version.cmp(&other.version) {
                    Ordering::Equal => {}
                    ord => return ord,
                }
            }
            ord => return ord,
        }

        revision_cmp(self.revision.as_deref(), other.revision.as_deref())
    }

    /// True when two versions name the same upstream release, ignoring
    /// the build revision
    pub fn same_release(&self, other: &PackageVersion) -> bool {
        self.epoch == other.epoch && self.version == other.version
    }
}

/// Compare revisions numerically where possible ("r2" < "r10")
fn revision_cmp(a: Option<&str>, b: Option<&str>) -> Ordering {
    fn revision_number(r: &str) -> Option<u64> {
        r.strip_prefix('r').and_then(|n| n.parse().ok())
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (revision_number(x), revision_number(y)) {
            (Some(nx), Some(ny)) => nx.cmp(&ny),
            _ => x.cmp(y),
        },
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(ref revision) = self.revision {
            write!(f, "-{}", revision)?;
        }
        Ok(())
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Version constraint operators
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionConstraint {
    /// Any version is acceptable
    Any,
    /// Exact version match
    Exact(PackageVersion),
    /// Greater than
    GreaterThan(PackageVersion),
    /// Greater than or equal
    GreaterOrEqual(PackageVersion),
    /// Less than
    LessThan(PackageVersion),
    /// Less than or equal
    LessOrEqual(PackageVersion),
    /// Same upstream release, any revision
    Compatible(PackageVersion),
}

impl VersionConstraint {
    /// Parse a version constraint string
    ///
    /// Examples:
    /// - ">=8.2" → GreaterOrEqual(8.2)
    /// - "<2.0" → LessThan(2.0)
    /// - "=1.5.0" → Exact(1.5.0)
    /// - "~8.2.1" → Compatible(8.2.1)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionConstraint::Any);
        }

        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionConstraint::GreaterOrEqual(PackageVersion::parse(
                rest.trim(),
            )?))
        } else if let Some(rest) = s.strip_prefix("<=") {
            Ok(VersionConstraint::LessOrEqual(PackageVersion::parse(
                rest.trim(),
            )?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(VersionConstraint::GreaterThan(PackageVersion::parse(
                rest.trim(),
            )?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(VersionConstraint::LessThan(PackageVersion::parse(
                rest.trim(),
            )?))
        } else if let Some(rest) = s.strip_prefix('~') {
            Ok(VersionConstraint::Compatible(PackageVersion::parse(
                rest.trim(),
            )?))
        } else if let Some(rest) = s.strip_prefix('=') {
            Ok(VersionConstraint::Exact(PackageVersion::parse(
                rest.trim(),
            )?))
        } else {
            // No operator means exact match
            Ok(VersionConstraint::Exact(PackageVersion::parse(s)?))
        }
    }

    /// Check if a version satisfies this constraint
    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Exact(v) => version == v,
            VersionConstraint::GreaterThan(v) => version > v,
            VersionConstraint::GreaterOrEqual(v) => version >= v,
            VersionConstraint::LessThan(v) => version < v,
            VersionConstraint::LessOrEqual(v) => version <= v,
            VersionConstraint::Compatible(v) => version.same_release(v),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::Exact(v) => write!(f, "={}", v),
            VersionConstraint::GreaterThan(v) => write!(f, ">{}", v),
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">={}", v),
            VersionConstraint::LessThan(v) => write!(f, "<{}", v),
            VersionConstraint::LessOrEqual(v) => write!(f, "<={}", v),
            VersionConstraint::Compatible(v) => write!(f, "~{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_simple() {
        let v = PackageVersion::parse("8.2.1").unwrap();
        assert_eq!(v.epoch, 0);
        assert_eq!(v.version, "8.2.1");
        assert_eq!(v.revision, None);
    }

    #[test]
    fn test_version_parse_with_epoch() {
        let v = PackageVersion::parse("2:8.2.1").unwrap();
        assert_eq!(v.epoch, 2);
        assert_eq!(v.version, "8.2.1");
    }

    #[test]
    fn test_version_parse_with_revision() {
        let v = PackageVersion::parse("8.2.1-r3").unwrap();
        assert_eq!(v.version, "8.2.1");
        assert_eq!(v.revision, Some("r3".to_string()));
    }

    #[test]
    fn test_version_parse_bad_epoch() {
        assert!(PackageVersion::parse("x:1.0").is_err());
    }

    #[test]
    fn test_version_compare_epochs() {
        let v1 = PackageVersion::parse("1:1.0.0").unwrap();
        let v2 = PackageVersion::parse("2.0.0").unwrap();
        assert!(v1 > v2);
    }

    #[test]
    fn test_version_compare_revisions() {
        let v1 = PackageVersion::parse("1.2.3-r2").unwrap();
        let v2 = PackageVersion::parse("1.2.3-r10").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn test_version_revision_beats_none() {
        let v1 = PackageVersion::parse("1.2.3").unwrap();
        let v2 = PackageVersion::parse("1.2.3-r1").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn test_same_release_ignores_revision() {
        let v1 = PackageVersion::parse("1.2.3").unwrap();
        let v2 = PackageVersion::parse("1.2.3-r1").unwrap();
        assert!(v1.same_release(&v2));
    }

    #[test]
    fn test_constraint_parse_and_satisfy() {
        let c = VersionConstraint::parse(">=8.2").unwrap();
        assert!(c.satisfies(&PackageVersion::parse("8.2").unwrap()));
        assert!(c.satisfies(&PackageVersion::parse("9.0").unwrap()));
        assert!(!c.satisfies(&PackageVersion::parse("8.1").unwrap()));
    }

    #[test]
    fn test_constraint_compatible() {
        let c = VersionConstraint::parse("~1.4").unwrap();
        assert!(c.satisfies(&PackageVersion::parse("1.4-r2").unwrap()));
        assert!(!c.satisfies(&PackageVersion::parse("1.5").unwrap()));
    }

    #[test]
    fn test_constraint_display_roundtrip() {
        let c = VersionConstraint::parse(">=1.0-r1").unwrap();
        assert_eq!(c.to_string(), ">=1.0-r1");
    }
}
