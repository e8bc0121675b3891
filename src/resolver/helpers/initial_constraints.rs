// src/resolver/helpers/initial_constraints.rs

//! Initial constraints, including those learned from restarts

use crate::resolver::constraint::Constraint;
use crate::resolver::restart::SuggestRestart;
use crate::resolver::resolvent::Resolvent;
use std::collections::HashMap;
use tracing::debug;

/// Supplies the constraints a resolution starts out with
///
/// This helper outlives individual resolution passes. Every caught
/// restart suggestion deposits its preset constraint here, so presets
/// accumulate across restarts within one `resolve()` call and each new
/// pass starts with everything learned so far.
#[derive(Debug)]
pub struct GetInitialConstraintsForHelper {
    initial: HashMap<Resolvent, Vec<Constraint>>,
    restarts_seen: u32,
}

impl GetInitialConstraintsForHelper {
    pub fn new() -> Self {
        Self {
            initial: HashMap::new(),
            restarts_seen: 0,
        }
    }

    /// Record a caught restart's preset constraint
    pub fn add_suggested_restart(&mut self, restart: &SuggestRestart) {
        debug!("Learning preset for {}: {}", restart.resolvent, restart.suggested_preset);
        self.initial
            .entry(restart.resolvent.clone())
            .or_default()
            .push(restart.suggested_preset.clone());
        self.restarts_seen += 1;
    }

    /// Seed a constraint directly (tests, explicit presets)
    pub fn add_initial_constraint(&mut self, resolvent: Resolvent, constraint: Constraint) {
        self.initial.entry(resolvent).or_default().push(constraint);
    }

    /// The constraints a fresh resolution for `resolvent` starts with
    pub fn initial_constraints_for(&self, resolvent: &Resolvent) -> Vec<Constraint> {
        self.initial.get(resolvent).cloned().unwrap_or_default()
    }

    /// True when nothing has been preset for `resolvent`
    ///
    /// A conflict on an already-preset resolvent must not restart
    /// again; the decider reports it as undecidable instead.
    pub fn is_untouched(&self, resolvent: &Resolvent) -> bool {
        self.initial
            .get(resolvent)
            .is_none_or(|constraints| constraints.is_empty())
    }

    /// How many restarts have been recorded
    pub fn restarts_seen(&self) -> u32 {
        self.restarts_seen
    }
}

impl Default for GetInitialConstraintsForHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::QualifiedName;
    use crate::resolver::constraint::UseExisting;
    use crate::resolver::decision::Decision;
    use crate::resolver::reason::Reason;
    use crate::resolver::resolvent::{DestinationType, SlotNameOrNull};
    use crate::spec::PackageSpec;
    use std::rc::Rc;

    fn resolvent(name: &str) -> Resolvent {
        Resolvent::new(
            QualifiedName::parse(name).unwrap(),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        )
    }

    fn preset_constraint(spec: &str) -> Constraint {
        Constraint::new(
            PackageSpec::parse(spec).unwrap(),
            Rc::new(Reason::Preset),
            DestinationType::Install,
            UseExisting::IfPossible,
        )
    }

    fn restart_for(name: &str, spec: &str) -> SuggestRestart {
        let keep = Decision::ExistingNoChange {
            existing_id: None,
            taken: true,
        };
        SuggestRestart {
            resolvent: resolvent(name),
            previous_decision: keep.clone(),
            problematic_constraint: preset_constraint(spec),
            new_decision: keep,
            suggested_preset: preset_constraint(spec),
        }
    }

    #[test]
    fn test_presets_accumulate_across_restarts() {
        let mut helper = GetInitialConstraintsForHelper::new();
        helper.add_suggested_restart(&restart_for("app/foo", ">=app/foo-2"));
        helper.add_suggested_restart(&restart_for("app/bar", ">=app/bar-3"));

        assert_eq!(helper.restarts_seen(), 2);
        assert_eq!(helper.initial_constraints_for(&resolvent("app/foo")).len(), 1);
        assert_eq!(helper.initial_constraints_for(&resolvent("app/bar")).len(), 1);
    }

    #[test]
    fn test_untouched_tracking() {
        let mut helper = GetInitialConstraintsForHelper::new();
        assert!(helper.is_untouched(&resolvent("app/foo")));
        helper.add_suggested_restart(&restart_for("app/foo", ">=app/foo-2"));
        assert!(!helper.is_untouched(&resolvent("app/foo")));
        assert!(helper.is_untouched(&resolvent("app/bar")));
    }
}
