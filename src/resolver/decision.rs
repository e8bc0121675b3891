// src/resolver/decision.rs

//! Decisions: the resolved outcome for one resolvent

use super::resolvent::DestinationType;
use crate::package::PackageId;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Something the user must confirm before a decision is acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Confirmation {
    /// The chosen id is older than what is installed
    Downgrade,
    /// The chosen id is masked and would be merged anyway
    MaskOverride,
    /// An installed package is removed without being named a target
    RemovalOfUsed,
}

/// A candidate that was considered and rejected, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsuitableCandidate {
    pub id: PackageId,
    /// Display forms of the constraints the candidate failed
    pub unmet_constraints: Vec<String>,
}

/// The resolved outcome for a resolvent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Merge a new id (install, upgrade, reinstall, or binary build)
    ChangesToMake {
        origin_id: PackageId,
        destination: DestinationType,
        /// Confirmations still required before this change may run
        confirmations: Vec<Confirmation>,
        taken: bool,
    },
    /// Whatever is there already (possibly nothing) stays
    ExistingNoChange {
        existing_id: Option<PackageId>,
        taken: bool,
    },
    /// Unmerge installed ids
    Remove {
        ids: Vec<PackageId>,
        confirmations: Vec<Confirmation>,
        taken: bool,
    },
    /// No decision satisfies the constraints; collected, not fatal
    UnableToMake {
        unsuitable: Vec<UnsuitableCandidate>,
        taken: bool,
    },
}

impl Decision {
    /// True for decisions that correspond to a real merge or unmerge
    pub fn is_change_or_remove(&self) -> bool {
        matches!(
            self,
            Decision::ChangesToMake { .. } | Decision::Remove { .. }
        )
    }

    /// True when the decision's constraints were taken
    pub fn is_taken(&self) -> bool {
        match self {
            Decision::ChangesToMake { taken, .. }
            | Decision::ExistingNoChange { taken, .. }
            | Decision::Remove { taken, .. }
            | Decision::UnableToMake { taken, .. } => *taken,
        }
    }

    /// The id being merged, for change decisions
    pub fn origin_id(&self) -> Option<&PackageId> {
        match self {
            Decision::ChangesToMake { origin_id, .. } => Some(origin_id),
            _ => None,
        }
    }

    /// Confirmations still outstanding
    pub fn confirmations(&self) -> &[Confirmation] {
        match self {
            Decision::ChangesToMake { confirmations, .. }
            | Decision::Remove { confirmations, .. } => confirmations,
            _ => &[],
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::ChangesToMake {
                origin_id,
                destination,
                ..
            } => write!(f, "merge {} to {}", origin_id, destination),
            Decision::ExistingNoChange {
                existing_id: Some(id),
                ..
            } => write!(f, "keep {}", id),
            Decision::ExistingNoChange {
                existing_id: None, ..
            } => write!(f, "keep nothing"),
            Decision::Remove { ids, .. } => {
                write!(f, "remove ")?;
                for (n, id) in ids.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", id)?;
                }
                Ok(())
            }
            Decision::UnableToMake { .. } => write!(f, "unable to decide"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::QualifiedName;
    use crate::package::OriginKind;
    use crate::version::PackageVersion;

    fn some_id() -> PackageId {
        PackageId::new(
            QualifiedName::new("app", "foo"),
            PackageVersion::parse("1.0").unwrap(),
            "0",
            "main",
            OriginKind::Source,
        )
    }

    #[test]
    fn test_change_or_remove_subset() {
        let change = Decision::ChangesToMake {
            origin_id: some_id(),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        };
        let keep = Decision::ExistingNoChange {
            existing_id: None,
            taken: true,
        };
        let remove = Decision::Remove {
            ids: vec![some_id()],
            confirmations: Vec::new(),
            taken: true,
        };
        let unable = Decision::UnableToMake {
            unsuitable: Vec::new(),
            taken: true,
        };

        assert!(change.is_change_or_remove());
        assert!(remove.is_change_or_remove());
        assert!(!keep.is_change_or_remove());
        assert!(!unable.is_change_or_remove());
    }

    #[test]
    fn test_display() {
        let change = Decision::ChangesToMake {
            origin_id: some_id(),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        };
        assert_eq!(change.to_string(), "merge app/foo-1.0:0::main to install");
    }
}
