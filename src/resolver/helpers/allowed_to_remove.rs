// src/resolver/helpers/allowed_to_remove.rs

//! May an installed package be removed?

use crate::package::PackageId;
use crate::resolver::reason::Reason;
use crate::resolver::resolution::Resolution;
use crate::spec::PackageSpec;

/// Decides whether removing an id is acceptable
///
/// Classification runs over the fully-unwrapped reasons of the
/// resolution's constraints: removals requested by a target, by a
/// dependent, or by a was-used-by edge are fine; removals that would be
/// a side effect of a dependency or binary link are not, unless the id
/// is explicitly allow-listed.
#[derive(Debug)]
pub struct AllowedToRemoveHelper {
    allowed_specs: Vec<PackageSpec>,
}

impl AllowedToRemoveHelper {
    pub fn new() -> Self {
        Self {
            allowed_specs: Vec::new(),
        }
    }

    /// Allow removal of anything matching the spec
    pub fn add_allowed_to_remove_spec(&mut self, spec: PackageSpec) {
        self.allowed_specs.push(spec);
    }

    /// Is removing `id` under this resolution acceptable?
    pub fn allowed_to_remove(&self, resolution: &Resolution, id: &PackageId) -> bool {
        for constraint in &resolution.constraints {
            match constraint.reason.unwrapped() {
                Reason::Dependent { .. } | Reason::Target { .. } | Reason::WasUsedBy { .. } => {
                    return true;
                }
                Reason::Dependency { .. } | Reason::ViaBinary { .. } | Reason::Preset => {}
                // Unreachable: unwrapped() never returns a wrapper
                Reason::Set { .. } | Reason::LikeOtherDestinationType { .. } => {}
            }
        }

        self.allowed_specs.iter().any(|spec| spec.matches(id))
    }
}

impl Default for AllowedToRemoveHelper {
    fn default() -> Self {
        Self::new()
    }
}
