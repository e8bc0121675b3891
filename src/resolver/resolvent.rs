// src/resolver/resolvent.rs

//! Resolvent: the identity key of the resolution map
//!
//! One resolvent names one package-slot heading for one destination.
//! The slot is tri-state: a concrete slot name, "unknown" (still to be
//! determined), or "no slot at all". Two null slots compare equal only
//! when they agree on which of those two null meanings they carry.

use crate::name::QualifiedName;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Where a resolved package is headed
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
pub enum DestinationType {
    /// Merge onto the live filesystem
    Install,
    /// Produce a binary package
    CreateBinary,
    /// Satisfy virtually, nothing lands on disk
    Virtual,
}

/// A slot name that may be null in two distinct ways
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotNameOrNull {
    /// A concrete slot
    Slot(String),
    /// No concrete slot; `null_means_unknown` distinguishes "not yet
    /// determined" from "has no slot"
    Null { null_means_unknown: bool },
}

impl SlotNameOrNull {
    /// A concrete slot
    pub fn slot(name: impl Into<String>) -> Self {
        SlotNameOrNull::Slot(name.into())
    }

    /// Slot still to be determined
    pub fn unknown() -> Self {
        SlotNameOrNull::Null {
            null_means_unknown: true,
        }
    }

    /// Definitely no slot
    pub fn none() -> Self {
        SlotNameOrNull::Null {
            null_means_unknown: false,
        }
    }

    /// The concrete slot name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            SlotNameOrNull::Slot(s) => Some(s),
            SlotNameOrNull::Null { .. } => None,
        }
    }
}

impl fmt::Display for SlotNameOrNull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotNameOrNull::Slot(s) => write!(f, ":{}", s),
            SlotNameOrNull::Null {
                null_means_unknown: true,
            } => write!(f, ":?"),
            SlotNameOrNull::Null {
                null_means_unknown: false,
            } => Ok(()),
        }
    }
}

/// One package-slot at one destination: the unique key into the
/// resolution map
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resolvent {
    pub package: QualifiedName,
    pub slot: SlotNameOrNull,
    pub destination_type: DestinationType,
}

impl Resolvent {
    pub fn new(
        package: QualifiedName,
        slot: SlotNameOrNull,
        destination_type: DestinationType,
    ) -> Self {
        Self {
            package,
            slot,
            destination_type,
        }
    }
}

impl fmt::Display for Resolvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.package, self.slot, self.destination_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_slot_equality() {
        assert_eq!(SlotNameOrNull::slot("0"), SlotNameOrNull::slot("0"));
        assert_ne!(SlotNameOrNull::slot("0"), SlotNameOrNull::slot("1"));
    }

    #[test]
    fn test_null_slot_equality_needs_same_meaning() {
        assert_eq!(SlotNameOrNull::unknown(), SlotNameOrNull::unknown());
        assert_eq!(SlotNameOrNull::none(), SlotNameOrNull::none());
        assert_ne!(SlotNameOrNull::unknown(), SlotNameOrNull::none());
    }

    #[test]
    fn test_concrete_never_equals_null() {
        assert_ne!(SlotNameOrNull::slot("0"), SlotNameOrNull::unknown());
        assert_ne!(SlotNameOrNull::slot("0"), SlotNameOrNull::none());
    }

    #[test]
    fn test_resolvent_display() {
        let r = Resolvent::new(
            QualifiedName::new("app", "foo"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );
        assert_eq!(r.to_string(), "app/foo:0/install");
    }

    #[test]
    fn test_resolvent_distinct_by_destination() {
        let a = Resolvent::new(
            QualifiedName::new("app", "foo"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );
        let mut b = a.clone();
        b.destination_type = DestinationType::CreateBinary;
        assert_ne!(a, b);
    }
}
