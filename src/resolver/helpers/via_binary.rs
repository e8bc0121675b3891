// src/resolver/helpers/via_binary.rs

//! Constraint synthesis for binary-producing resolvents

use crate::resolver::constraint::{Constraint, UseExisting};
use crate::resolver::reason::Reason;
use crate::resolver::resolution::Resolution;
use crate::spec::PackageSpec;
use std::rc::Rc;

/// Builds the constraint that forces a binary to be produced for a
/// resolvent because another resolvent wants to install from it
///
/// The synthesised constraint names only the package (no version or
/// slot restriction), is untaken, and never reuses an existing id; the
/// reason links back to the resolvent that wants the binary.
#[derive(Debug)]
pub struct GetConstraintsForViaBinaryHelper;

impl GetConstraintsForViaBinaryHelper {
    pub fn new() -> Self {
        Self
    }

    /// The constraints to add to `resolution` on behalf of
    /// `other_resolution`
    pub fn constraints_for(
        &self,
        resolution: &Resolution,
        other_resolution: &Resolution,
    ) -> Vec<Constraint> {
        let spec = PackageSpec::name_only(resolution.resolvent.package.clone());
        let reason = Rc::new(Reason::ViaBinary {
            other_resolvent: other_resolution.resolvent.clone(),
        });

        vec![
            Constraint::new(
                spec,
                reason,
                resolution.resolvent.destination_type,
                UseExisting::Never,
            )
            .with_untaken(true),
        ]
    }
}

impl Default for GetConstraintsForViaBinaryHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::QualifiedName;
    use crate::resolver::resolvent::{DestinationType, Resolvent, SlotNameOrNull};
    use crate::version::VersionConstraint;

    fn resolution(name: &str, destination: DestinationType) -> Resolution {
        Resolution::new(Resolvent::new(
            QualifiedName::parse(name).unwrap(),
            SlotNameOrNull::slot("0"),
            destination,
        ))
    }

    #[test]
    fn test_synthesised_constraint_shape() {
        let helper = GetConstraintsForViaBinaryHelper::new();
        let binary_side = resolution("app/foo", DestinationType::CreateBinary);
        let install_side = resolution("app/foo", DestinationType::Install);

        let constraints = helper.constraints_for(&binary_side, &install_side);
        assert_eq!(constraints.len(), 1);

        let c = &constraints[0];
        assert_eq!(c.spec.name, QualifiedName::new("app", "foo"));
        assert_eq!(c.spec.version, VersionConstraint::Any);
        assert_eq!(c.spec.slot, None);
        assert!(c.untaken);
        assert_eq!(c.use_existing, UseExisting::Never);
        assert_eq!(c.destination_type, DestinationType::CreateBinary);

        match &*c.reason {
            Reason::ViaBinary { other_resolvent } => {
                assert_eq!(*other_resolvent, install_side.resolvent);
            }
            other => panic!("expected ViaBinary reason, got {:?}", other),
        }
    }
}
