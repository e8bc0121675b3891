// src/resolver/constraint.rs

//! Constraints: one requirement on a resolvent

use super::reason::Reason;
use super::resolvent::DestinationType;
use crate::spec::PackageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use strum_macros::{Display, EnumString};

/// When an already-installed id may satisfy a constraint
///
/// Variants are ordered strictest first; the strictest across a
/// resolution's constraints wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UseExisting {
    /// Always rebuild or reinstall
    Never,
    /// Reuse only the exact same id
    IfSame,
    /// Reuse any id of the same version
    IfSameVersion,
    /// Reuse anything that satisfies the spec
    IfPossible,
}

/// One requirement attached to a resolvent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// What must (or, for blockers, must not) be matched
    pub spec: PackageSpec,
    /// Why this requirement exists; shared with other constraints that
    /// arose from the same cause
    pub reason: Rc<Reason>,
    pub destination_type: DestinationType,
    pub use_existing: UseExisting,
    /// True when the requirement is optional and currently not taken
    pub untaken: bool,
    /// True when an empty result also satisfies the requirement
    pub nothing_is_fine_too: bool,
}

impl Constraint {
    pub fn new(
        spec: PackageSpec,
        reason: Rc<Reason>,
        destination_type: DestinationType,
        use_existing: UseExisting,
    ) -> Self {
        Self {
            spec,
            reason,
            destination_type,
            use_existing,
            untaken: false,
            nothing_is_fine_too: false,
        }
    }

    pub fn with_untaken(mut self, untaken: bool) -> Self {
        self.untaken = untaken;
        self
    }

    pub fn with_nothing_is_fine_too(mut self, b: bool) -> Self {
        self.nothing_is_fine_too = b;
        self
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}, use-existing {}{})",
            self.spec,
            self.reason,
            self.use_existing,
            if self.untaken { ", untaken" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_existing_strictness_order() {
        // min() over constraints picks the strictest policy
        assert!(UseExisting::Never < UseExisting::IfSame);
        assert!(UseExisting::IfSame < UseExisting::IfSameVersion);
        assert!(UseExisting::IfSameVersion < UseExisting::IfPossible);
    }

    #[test]
    fn test_shared_reason() {
        let reason = Rc::new(Reason::Preset);
        let a = Constraint::new(
            PackageSpec::parse("app/foo").unwrap(),
            Rc::clone(&reason),
            DestinationType::Install,
            UseExisting::IfPossible,
        );
        let b = Constraint::new(
            PackageSpec::parse("app/bar").unwrap(),
            Rc::clone(&reason),
            DestinationType::CreateBinary,
            UseExisting::Never,
        );
        assert!(Rc::ptr_eq(&a.reason, &b.reason));
        assert_eq!(Rc::strong_count(&reason), 3);
    }
}
