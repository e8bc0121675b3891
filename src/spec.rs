// src/spec.rs

//! Package specs: the textual subset understood by targets and
//! allow-lists
//!
//! Format: `[!][op]category/name[-version][:slot]`
//!
//! - `app/foo` - any version of app/foo
//! - `app/foo:0` - any version in slot 0
//! - `>=app/bar-2` - version 2 or newer
//! - `!app/baz` - a blocker: no version may be installed
//!
//! The full dependency grammar lives with the repository back-ends; this
//! subset is what run configuration and command-line targets supply.
//! Parse failures here are fatal, never collected.

use crate::error::{Error, Result};
use crate::name::QualifiedName;
use crate::package::PackageId;
use crate::version::VersionConstraint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed package spec
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Package the spec names
    pub name: QualifiedName,
    /// Version restriction, `Any` when the spec names no version
    pub version: VersionConstraint,
    /// Slot restriction, if the spec names one
    pub slot: Option<String>,
    /// True for blockers (`!spec`): no matching id may be installed
    pub block: bool,
}

impl PackageSpec {
    /// A spec matching any version of a package in any slot
    pub fn name_only(name: QualifiedName) -> Self {
        Self {
            name,
            version: VersionConstraint::Any,
            slot: None,
            block: false,
        }
    }

    /// Parse a spec string
    pub fn parse(s: &str) -> Result<Self> {
        let original = s;
        let s = s.trim();

        let (block, s) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        // Slot restriction comes after the first colon
        let (base, slot) = match s.find(':') {
            Some(pos) => {
                let slot = &s[pos + 1..];
                if slot.is_empty() {
                    return Err(Error::Spec {
                        spec: original.to_string(),
                        reason: "empty slot".to_string(),
                    });
                }
                (&s[..pos], Some(slot.to_string()))
            }
            None => (s, None),
        };

        let op = ["<=", ">=", "<", ">", "=", "~"]
            .iter()
            .find(|op| base.starts_with(**op))
            .copied();

        let (name, version) = match op {
            Some(op) => {
                let rest = &base[op.len()..];
                let (name_str, version_str) =
                    split_name_version(rest).ok_or_else(|| Error::Spec {
                        spec: original.to_string(),
                        reason: "operator requires a version".to_string(),
                    })?;
                let name = QualifiedName::parse(name_str).map_err(|e| Error::Spec {
                    spec: original.to_string(),
                    reason: e.to_string(),
                })?;
                let version =
                    VersionConstraint::parse(&format!("{}{}", op, version_str)).map_err(|e| {
                        Error::Spec {
                            spec: original.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                (name, version)
            }
            None => {
                let name = QualifiedName::parse(base).map_err(|e| Error::Spec {
                    spec: original.to_string(),
                    reason: e.to_string(),
                })?;
                (name, VersionConstraint::Any)
            }
        };

        Ok(Self {
            name,
            version,
            slot,
            block,
        })
    }

    /// Check whether an id matches this spec (name, version, slot)
    ///
    /// Blockers match the same ids as their positive form; the caller
    /// decides what a blocker match means.
    pub fn matches(&self, id: &PackageId) -> bool {
        if self.name != id.name {
            return false;
        }
        if !self.version.satisfies(&id.version) {
            return false;
        }
        if let Some(ref slot) = self.slot
            && *slot != id.slot
        {
            return false;
        }
        true
    }

    /// Check whether the spec names this package at all, ignoring
    /// version and slot restrictions
    pub fn matches_name(&self, name: &QualifiedName) -> bool {
        self.name == *name
    }

    /// True when the spec restricts version or slot (anything beyond the
    /// bare package name)
    pub fn is_narrowing(&self) -> bool {
        self.slot.is_some() || self.version != VersionConstraint::Any
    }
}

/// Split `category/name-version` into name and version parts
///
/// The version starts at the first hyphen whose remainder parses as a
/// version; package names may themselves contain hyphens.
fn split_name_version(s: &str) -> Option<(&str, &str)> {
    let mut search_from = 0;
    while let Some(off) = s[search_from..].find('-') {
        let pos = search_from + off;
        let candidate = &s[pos + 1..];
        if candidate.starts_with(|c: char| c.is_ascii_digit())
            && crate::version::PackageVersion::parse(candidate).is_ok()
        {
            return Some((&s[..pos], candidate));
        }
        search_from = pos + 1;
    }
    None
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.block {
            write!(f, "!")?;
        }
        match &self.version {
            VersionConstraint::Any => write!(f, "{}", self.name)?,
            VersionConstraint::Exact(v) => write!(f, "={}-{}", self.name, v)?,
            VersionConstraint::GreaterThan(v) => write!(f, ">{}-{}", self.name, v)?,
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">={}-{}", self.name, v)?,
            VersionConstraint::LessThan(v) => write!(f, "<{}-{}", self.name, v)?,
            VersionConstraint::LessOrEqual(v) => write!(f, "<={}-{}", self.name, v)?,
            VersionConstraint::Compatible(v) => write!(f, "~{}-{}", self.name, v)?,
        }
        if let Some(ref slot) = self.slot {
            write!(f, ":{}", slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{OriginKind, PackageId};
    use crate::version::PackageVersion;

    fn id(name: &str, version: &str, slot: &str) -> PackageId {
        PackageId::new(
            QualifiedName::parse(name).unwrap(),
            PackageVersion::parse(version).unwrap(),
            slot,
            "test-repo",
            OriginKind::Source,
        )
    }

    #[test]
    fn test_parse_name_only() {
        let spec = PackageSpec::parse("app/foo").unwrap();
        assert_eq!(spec.name.to_string(), "app/foo");
        assert_eq!(spec.version, VersionConstraint::Any);
        assert_eq!(spec.slot, None);
        assert!(!spec.block);
    }

    #[test]
    fn test_parse_with_slot() {
        let spec = PackageSpec::parse("app/foo:0").unwrap();
        assert_eq!(spec.slot, Some("0".to_string()));
        assert!(spec.is_narrowing());
    }

    #[test]
    fn test_parse_versioned() {
        let spec = PackageSpec::parse(">=app/bar-2").unwrap();
        assert!(spec.matches(&id("app/bar", "2.1", "0")));
        assert!(!spec.matches(&id("app/bar", "1.9", "0")));
    }

    #[test]
    fn test_parse_versioned_with_slot() {
        let spec = PackageSpec::parse(">=app/bar-2.1:1").unwrap();
        assert_eq!(spec.slot, Some("1".to_string()));
        assert!(spec.matches(&id("app/bar", "2.1", "1")));
        assert!(!spec.matches(&id("app/bar", "2.1", "0")));
    }

    #[test]
    fn test_parse_hyphenated_name() {
        let spec = PackageSpec::parse("=dev-libs/libfoo-bar-1.2").unwrap();
        assert_eq!(spec.name.to_string(), "dev-libs/libfoo-bar");
        assert!(spec.matches(&id("dev-libs/libfoo-bar", "1.2", "0")));
    }

    #[test]
    fn test_parse_blocker() {
        let spec = PackageSpec::parse("!app/baz").unwrap();
        assert!(spec.block);
        assert!(spec.matches(&id("app/baz", "1.0", "0")));
    }

    #[test]
    fn test_parse_operator_without_version() {
        assert!(PackageSpec::parse(">=app/bar").is_err());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(PackageSpec::parse("not-a-spec").is_err());
        assert!(PackageSpec::parse("app/foo:").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["app/foo", "app/foo:0", ">=app/bar-2:1", "!app/baz"] {
            let spec = PackageSpec::parse(s).unwrap();
            assert_eq!(spec.to_string(), s);
        }
    }
}
