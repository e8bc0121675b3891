// src/resolver/reason.rs

//! Reasons: why a constraint exists
//!
//! A reason is a recursive classification. `Set` and
//! `LikeOtherDestinationType` wrap another reason; classification
//! questions ("is this a target?", "which id caused this?") revisit
//! through the wrappers to the terminal variant. Reasons are shared by
//! `Rc`: one `ViaBinary` reason may be referenced from constraints on
//! two different resolutions.

use super::resolvent::Resolvent;
use crate::name::QualifiedName;
use crate::package::{DepKind, PackageId};
use crate::spec::PackageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Why a constraint exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// The user asked for this directly
    Target { spec: PackageSpec },
    /// A package's dependency pulled this in
    Dependency {
        from_id: PackageId,
        dep_kind: DepKind,
    },
    /// Something depending on a package being removed needs attention
    Dependent { id: PackageId },
    /// Learned from an earlier pass of the same resolution
    Preset,
    /// A package being removed was used to build this one
    WasUsedBy { user: QualifiedName },
    /// Another resolvent needs this one built as its binary source
    ViaBinary { other_resolvent: Resolvent },
    /// Came from a named set; wraps the set's own reason
    Set {
        set_name: String,
        wrapped: Rc<Reason>,
    },
    /// Mirrors a resolvent at another destination; wraps its reason
    LikeOtherDestinationType {
        other_resolvent: Resolvent,
        wrapped: Rc<Reason>,
    },
}

impl Reason {
    /// True only when the fully-unwrapped reason is `Target`
    pub fn is_target(&self) -> bool {
        match self {
            Reason::Target { .. } => true,
            Reason::Set { wrapped, .. } | Reason::LikeOtherDestinationType { wrapped, .. } => {
                wrapped.is_target()
            }
            _ => false,
        }
    }

    /// The id whose dependency caused this reason, revisiting through
    /// wrappers; `None` for every non-dependency terminal
    pub fn from_package_id(&self) -> Option<&PackageId> {
        match self {
            Reason::Dependency { from_id, .. } => Some(from_id),
            Reason::Set { wrapped, .. } | Reason::LikeOtherDestinationType { wrapped, .. } => {
                wrapped.from_package_id()
            }
            _ => None,
        }
    }

    /// The terminal reason after unwrapping every wrapper
    pub fn unwrapped(&self) -> &Reason {
        match self {
            Reason::Set { wrapped, .. } | Reason::LikeOtherDestinationType { wrapped, .. } => {
                wrapped.unwrapped()
            }
            other => other,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Target { spec } => write!(f, "target '{}'", spec),
            Reason::Dependency { from_id, dep_kind } => {
                write!(f, "{} dependency of {}", dep_kind, from_id)
            }
            Reason::Dependent { id } => write!(f, "dependent of {}", id),
            Reason::Preset => write!(f, "preset"),
            Reason::WasUsedBy { user } => write!(f, "was used by {}", user),
            Reason::ViaBinary { other_resolvent } => {
                write!(f, "binary needed by {}", other_resolvent)
            }
            Reason::Set { set_name, wrapped } => write!(f, "set '{}' ({})", set_name, wrapped),
            Reason::LikeOtherDestinationType {
                other_resolvent,
                wrapped,
            } => write!(f, "like {} ({})", other_resolvent, wrapped),
        }
    }
}
