// src/package/mod.rs

//! Package identity and metadata
//!
//! A `PackageId` names one concrete package occurrence: a qualified
//! name, version and slot in a particular repository, as either source,
//! pre-built binary, or an installed entry. Identity (equality, hash,
//! ordering) covers exactly those fields; masks, dependencies and
//! behaviour flags ride along as metadata.

use crate::name::QualifiedName;
use crate::spec::PackageSpec;
use crate::version::PackageVersion;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use strum_macros::{Display, EnumString};

/// Where an id's content comes from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum OriginKind {
    /// Built from source at merge time
    Source,
    /// A pre-built binary package
    Binary,
    /// An entry in the installed-package database
    Installed,
}

/// Why an id is masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MaskKind {
    /// Keyword/arch mask: ordinary, user-overridable
    Keyword,
    /// User configuration mask: ordinary
    User,
    /// Repository-level mask: strong
    Repository,
    /// Profile mask: strong
    Profile,
}

impl MaskKind {
    /// Strong masks survive ordinary mask overrides
    pub fn is_strong(&self) -> bool {
        matches!(self, MaskKind::Repository | MaskKind::Profile)
    }
}

/// One mask entry on an id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mask {
    pub kind: MaskKind,
    /// Short explanation token (e.g. the keyword or mask file comment)
    pub token: String,
}

impl Mask {
    pub fn new(kind: MaskKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }
}

/// Dependency classes a package declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DepKind {
    /// Needed to build
    Build,
    /// Needed at runtime
    Run,
    /// Needed after merge (circular-tolerant runtime)
    Post,
    /// Optional, user-facing suggestion
    Suggestion,
    /// Optional, on-by-default recommendation
    Recommendation,
}

impl DepKind {
    /// Runtime-ish dependencies follow the installed image, not the
    /// build environment
    pub fn is_run_or_post(&self) -> bool {
        matches!(self, DepKind::Run | DepKind::Post)
    }

    /// Suggestions and recommendations are optional
    pub fn is_optional(&self) -> bool {
        matches!(self, DepKind::Suggestion | DepKind::Recommendation)
    }
}

/// One declared dependency of a package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub spec: PackageSpec,
    pub kind: DepKind,
    /// Optional suggestion group annotation
    pub group: Option<String>,
}

impl Dependency {
    pub fn new(spec: PackageSpec, kind: DepKind) -> Self {
        Self {
            spec,
            kind,
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// One concrete package occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageId {
    pub name: QualifiedName,
    pub version: PackageVersion,
    pub slot: String,
    /// Repository the id lives in
    pub repository: String,
    pub origin: OriginKind,

    // Metadata: not part of identity
    pub masks: Vec<Mask>,
    /// Whether a binary package can be produced from this id
    pub binary_buildable: bool,
    pub dependencies: Vec<Dependency>,
}

impl PackageId {
    pub fn new(
        name: QualifiedName,
        version: PackageVersion,
        slot: impl Into<String>,
        repository: impl Into<String>,
        origin: OriginKind,
    ) -> Self {
        Self {
            name,
            version,
            slot: slot.into(),
            repository: repository.into(),
            origin,
            masks: Vec::new(),
            binary_buildable: origin == OriginKind::Source,
            dependencies: Vec::new(),
        }
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.masks.push(mask);
        self
    }

    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn with_binary_buildable(mut self, b: bool) -> Self {
        self.binary_buildable = b;
        self
    }

    /// True if any mask applies
    pub fn is_masked(&self) -> bool {
        !self.masks.is_empty()
    }

    /// True if a strong (repository or profile) mask applies
    pub fn is_strongly_masked(&self) -> bool {
        self.masks.iter().any(|m| m.kind.is_strong())
    }

    /// True when the other id is the same release of the same package
    /// (possibly from a different repository or origin)
    pub fn same_release_as(&self, other: &PackageId) -> bool {
        self.name == other.name && self.slot == other.slot && self.version.same_release(&other.version)
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.slot == other.slot
            && self.repository == other.repository
            && self.origin == other.origin
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.slot.hash(state);
        self.repository.hash(state);
        self.origin.hash(state);
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.slot.cmp(&other.slot))
            .then_with(|| self.repository.cmp(&other.repository))
            .then_with(|| self.origin.cmp(&other.origin))
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}::{}",
            self.name, self.version, self.slot, self.repository
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(version: &str, repo: &str, origin: OriginKind) -> PackageId {
        PackageId::new(
            QualifiedName::new("app", "foo"),
            PackageVersion::parse(version).unwrap(),
            "0",
            repo,
            origin,
        )
    }

    #[test]
    fn test_identity_ignores_metadata() {
        let a = id("1.0", "main", OriginKind::Source);
        let b = id("1.0", "main", OriginKind::Source).with_mask(Mask::new(MaskKind::Keyword, "~amd64"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_distinguishes_origin() {
        let a = id("1.0", "main", OriginKind::Source);
        let b = id("1.0", "main", OriginKind::Binary);
        assert_ne!(a, b);
    }

    #[test]
    fn test_strong_mask() {
        let a = id("1.0", "main", OriginKind::Source).with_mask(Mask::new(MaskKind::Keyword, "~amd64"));
        assert!(a.is_masked());
        assert!(!a.is_strongly_masked());

        let b = id("1.0", "main", OriginKind::Source).with_mask(Mask::new(MaskKind::Profile, "profile"));
        assert!(b.is_strongly_masked());
    }

    #[test]
    fn test_same_release_across_origins() {
        let src = id("1.0", "main", OriginKind::Source);
        let bin = id("1.0-r1", "binhost", OriginKind::Binary);
        assert!(src.same_release_as(&bin));
    }

    #[test]
    fn test_display() {
        let a = id("1.0", "main", OriginKind::Source);
        assert_eq!(a.to_string(), "app/foo-1.0:0::main");
    }
}
