// src/resolver/decider.rs

//! Per-pass decision making
//!
//! The decider owns one pass's resolution map and work list. It turns
//! target specs into resolvents, accumulates constraints, decides each
//! resolvent, and walks the decided origins' dependencies, discovering
//! new resolvents as it goes. When a late constraint contradicts a
//! decision that was already made, it hands a restart suggestion back
//! to the driver instead of patching the graph in place.

use super::constraint::{Constraint, UseExisting};
use super::decision::{Confirmation, Decision, UnsuitableCandidate};
use super::helpers::{Helpers, SpecInterest};
use super::job::{WorkList, WorkListIndex};
use super::order::PackageIdComparatorWithPromotion;
use super::reason::Reason;
use super::resolution::Resolution;
use super::resolvent::{DestinationType, Resolvent, SlotNameOrNull};
use super::restart::SuggestRestart;
use crate::env::{Environment, Filter, Generator, Selection, SelectionCache};
use crate::error::Result;
use crate::package::PackageId;
use crate::spec::PackageSpec;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// What the user asked to be allowed without confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissions {
    pub permit_downgrade: bool,
    pub permit_mask_override: bool,
    pub permit_removal_of_used: bool,
}

/// Outcome of one full decider pass
#[derive(Debug)]
pub enum PassOutcome {
    /// Every reachable resolvent has a decision
    Finished,
    /// A conflict wants a whole-graph restart
    Restart(Box<SuggestRestart>),
}

/// Outcome of applying one constraint
enum ConstraintApplied {
    Accepted,
    NeedsRestart(Box<SuggestRestart>),
}

/// One pass's resolution state
pub struct Decider<'a> {
    env: &'a dyn Environment,
    cache: &'a SelectionCache,
    helpers: &'a Helpers,
    permissions: Permissions,
    use_existing_for_targets: UseExisting,
    use_existing_for_dependencies: UseExisting,

    resolutions: HashMap<Resolvent, Resolution>,
    /// Discovery order of the map's keys
    order: Vec<Resolvent>,
    /// Resolvents still to be decided and expanded
    worklist: WorkList<Resolvent>,
    cursor: usize,
}

impl<'a> Decider<'a> {
    pub fn new(
        env: &'a dyn Environment,
        cache: &'a SelectionCache,
        helpers: &'a Helpers,
        permissions: Permissions,
        use_existing_for_targets: UseExisting,
        use_existing_for_dependencies: UseExisting,
    ) -> Self {
        Self {
            env,
            cache,
            helpers,
            permissions,
            use_existing_for_targets,
            use_existing_for_dependencies,
            resolutions: HashMap::new(),
            order: Vec::new(),
            worklist: WorkList::new(),
            cursor: 0,
        }
    }

    /// The resolution map in discovery order
    pub fn into_resolutions(self) -> (Vec<Resolvent>, HashMap<Resolvent, Resolution>) {
        (self.order, self.resolutions)
    }

    /// Add one target spec with a target reason
    pub fn add_target(&mut self, spec: &PackageSpec) -> Result<()> {
        let reason = Rc::new(Reason::Target { spec: spec.clone() });
        debug!("Adding target '{}'", spec);

        if spec.block {
            // A removal request: constrain every installed slot of the
            // named package to nothing
            for resolvent in self.resolvents_for_blocker(spec) {
                let constraint = Constraint::new(
                    spec.clone(),
                    Rc::clone(&reason),
                    resolvent.destination_type,
                    UseExisting::IfPossible,
                )
                .with_nothing_is_fine_too(true);
                self.apply_constraint_infallible(&resolvent, constraint);
            }
            return Ok(());
        }

        let (resolvents, _was_narrowed) = self.helpers.resolvents_for.resolvents_for(
            self.env,
            self.cache,
            spec,
            None,
            None,
            &reason,
        );

        if resolvents.is_empty() {
            // Nothing matches: record an error resolvent so the failure
            // is reported with everything else at the end
            let resolvent = self.error_resolvent_for(spec);
            let constraint = Constraint::new(
                spec.clone(),
                Rc::clone(&reason),
                resolvent.destination_type,
                self.use_existing_for_targets,
            );
            self.apply_constraint_infallible(&resolvent, constraint);
            return Ok(());
        }

        for resolvent in resolvents {
            let constraint = Constraint::new(
                spec.clone(),
                Rc::clone(&reason),
                resolvent.destination_type,
                self.use_existing_for_targets,
            );
            self.apply_constraint_infallible(&resolvent, constraint);
        }
        Ok(())
    }

    /// Decide and expand until nothing is left, or a restart is needed
    pub fn resolve(&mut self) -> Result<PassOutcome> {
        loop {
            while self.cursor < self.worklist.len() {
                let resolvent = self
                    .worklist
                    .fetch(WorkListIndex(self.cursor))
                    .cloned()
                    .expect("worklist index within bounds");
                self.cursor += 1;

                if self
                    .resolutions
                    .get(&resolvent)
                    .is_some_and(|r| r.decision.is_some())
                {
                    continue;
                }

                self.decide(&resolvent);

                if let ConstraintApplied::NeedsRestart(restart) =
                    self.add_dependencies_if_necessary(&resolvent)?
                {
                    return Ok(PassOutcome::Restart(restart));
                }
            }

            // Via-binary pass: decided changes that must be routed
            // through a binary build spawn binary-producing resolvents
            if !self.add_via_binary_resolvents() {
                break;
            }
        }

        Ok(PassOutcome::Finished)
    }

    /// Get or create the resolution for a resolvent, seeding initial
    /// constraints and queueing it for work
    fn resolution_for_resolvent(&mut self, resolvent: &Resolvent) -> &mut Resolution {
        if !self.resolutions.contains_key(resolvent) {
            let mut resolution = Resolution::new(resolvent.clone());
            for preset in self
                .helpers
                .initial_constraints
                .initial_constraints_for(resolvent)
            {
                resolution.add_constraint(preset);
            }
            self.resolutions.insert(resolvent.clone(), resolution);
            self.order.push(resolvent.clone());
            self.worklist.append(resolvent.clone());
        }
        self.resolutions
            .get_mut(resolvent)
            .expect("resolution just inserted")
    }

    /// Apply a constraint that cannot conflict (fresh or undecided
    /// resolutions only)
    fn apply_constraint_infallible(&mut self, resolvent: &Resolvent, constraint: Constraint) {
        match self.apply_constraint(resolvent, constraint) {
            ConstraintApplied::Accepted => {}
            ConstraintApplied::NeedsRestart(restart) => {
                // Targets are added before anything is decided
                unreachable!("constraint conflict before any decision: {}", restart)
            }
        }
    }

    /// Apply one constraint, checking it against any existing decision
    fn apply_constraint(
        &mut self,
        resolvent: &Resolvent,
        constraint: Constraint,
    ) -> ConstraintApplied {
        let resolution = self.resolution_for_resolvent(resolvent);

        let decision = resolution.decision.clone();
        match decision {
            None => {
                resolution.add_constraint(constraint);
                ConstraintApplied::Accepted
            }
            Some(decision) => {
                if self.constraint_matches(&constraint, &decision) {
                    let resolution = self
                        .resolutions
                        .get_mut(resolvent)
                        .expect("resolution exists");
                    resolution.add_constraint(constraint);
                    ConstraintApplied::Accepted
                } else {
                    self.made_wrong_decision(resolvent, constraint, decision)
                }
            }
        }
    }

    /// Does a decision satisfy a constraint?
    fn constraint_matches(&self, constraint: &Constraint, decision: &Decision) -> bool {
        match decision {
            Decision::ChangesToMake { origin_id, .. } => {
                let spec_ok = if constraint.spec.block {
                    !constraint.spec.matches(origin_id)
                } else {
                    constraint.spec.matches(origin_id)
                };
                // A taken constraint cannot be satisfied by an untaken
                // decision
                spec_ok && (decision.is_taken() || constraint.untaken)
            }
            Decision::ExistingNoChange {
                existing_id: Some(id),
                ..
            } => {
                if constraint.spec.block {
                    !constraint.spec.matches(id)
                } else {
                    constraint.spec.matches(id) && constraint.use_existing != UseExisting::Never
                }
            }
            Decision::ExistingNoChange {
                existing_id: None, ..
            } => constraint.spec.block || constraint.nothing_is_fine_too,
            Decision::Remove { .. } => constraint.spec.block || constraint.nothing_is_fine_too,
            // Collected and reported at the end; anything goes
            Decision::UnableToMake { .. } => true,
        }
    }

    /// A constraint arrived that the existing decision cannot satisfy
    fn made_wrong_decision(
        &mut self,
        resolvent: &Resolvent,
        constraint: Constraint,
        previous_decision: Decision,
    ) -> ConstraintApplied {
        debug!(
            "Wrong decision for {}: '{}' vs constraint {}",
            resolvent, previous_decision, constraint
        );

        // Would all constraints, including the new one, admit a decision?
        let mut adapted = self
            .resolutions
            .get(resolvent)
            .expect("resolution exists")
            .clone();
        adapted.add_constraint(constraint.clone());

        match self.try_to_find_decision_for(&adapted) {
            Some(new_decision) if self.helpers.initial_constraints.is_untouched(resolvent) => {
                let suggested_preset = self.constraint_for_preloading(resolvent, &new_decision);
                ConstraintApplied::NeedsRestart(Box::new(SuggestRestart {
                    resolvent: resolvent.clone(),
                    previous_decision,
                    problematic_constraint: constraint,
                    new_decision,
                    suggested_preset,
                }))
            }
            _ => {
                // Either nothing satisfies the union, or this resolvent
                // was already preset by an earlier restart; record the
                // failure rather than looping
                let unsuitable = self.unsuitable_candidates_for(&adapted);
                let taken = adapted.is_taken();
                let resolution = self
                    .resolutions
                    .get_mut(resolvent)
                    .expect("resolution exists");
                resolution.add_constraint(constraint);
                resolution.decision = Some(Decision::UnableToMake { unsuitable, taken });
                ConstraintApplied::Accepted
            }
        }
    }

    /// The preset constraint a restart seeds the next pass with
    fn constraint_for_preloading(&self, resolvent: &Resolvent, decision: &Decision) -> Constraint {
        let mut nothing_is_fine_too = false;
        let spec = match decision {
            Decision::Remove { .. }
            | Decision::ExistingNoChange {
                existing_id: None, ..
            } => {
                nothing_is_fine_too = true;
                let mut spec = PackageSpec::name_only(resolvent.package.clone());
                spec.block = true;
                spec
            }
            _ => match decision.origin_id() {
                Some(id) => PackageSpec {
                    name: id.name.clone(),
                    version: crate::version::VersionConstraint::Exact(id.version.clone()),
                    slot: Some(id.slot.clone()),
                    block: false,
                },
                None => PackageSpec::name_only(resolvent.package.clone()),
            },
        };
        Constraint::new(
            spec,
            Rc::new(Reason::Preset),
            resolvent.destination_type,
            UseExisting::IfPossible,
        )
        .with_nothing_is_fine_too(nothing_is_fine_too)
    }

    /// Decide one resolvent from its accumulated constraints
    fn decide(&mut self, resolvent: &Resolvent) {
        let resolution = self
            .resolutions
            .get(resolvent)
            .expect("worklist entries have resolutions")
            .clone();

        let decision = match self.try_to_find_decision_for(&resolution) {
            Some(decision) => decision,
            None => Decision::UnableToMake {
                unsuitable: self.unsuitable_candidates_for(&resolution),
                taken: resolution.is_taken(),
            },
        };

        trace!("Decided {}: {}", resolvent, decision);
        self.resolutions
            .get_mut(resolvent)
            .expect("resolution exists")
            .decision = Some(decision);
    }

    /// The best decision the constraints admit, if any
    fn try_to_find_decision_for(&self, resolution: &Resolution) -> Option<Decision> {
        let resolvent = &resolution.resolvent;
        let taken = resolution.is_taken();

        if resolution.constraints.iter().any(|c| c.spec.block) {
            return self.decide_removal(resolution, taken);
        }

        let existing = self.existing_id_for(resolvent);
        let use_existing = resolution
            .constraints
            .iter()
            .map(|c| c.use_existing)
            .min()
            .unwrap_or(self.use_existing_for_dependencies);

        let candidates = self.installable_candidates_for(resolution);
        let comparator = PackageIdComparatorWithPromotion::new(self.env);
        let chosen = comparator.preferred(&candidates).cloned();

        // Reuse the existing id when the policy admits it
        if let Some(ref existing_id) = existing {
            let satisfies_all = resolution
                .constraints
                .iter()
                .all(|c| c.spec.matches(existing_id));
            let reuse = match use_existing {
                UseExisting::Never => false,
                UseExisting::IfPossible => satisfies_all,
                UseExisting::IfSameVersion => {
                    satisfies_all
                        && chosen
                            .as_ref()
                            .is_some_and(|c| c.version.same_release(&existing_id.version))
                }
                UseExisting::IfSame => {
                    satisfies_all
                        && chosen
                            .as_ref()
                            .is_some_and(|c| c.version == existing_id.version)
                }
            };
            if reuse {
                return Some(Decision::ExistingNoChange {
                    existing_id: Some(existing_id.clone()),
                    taken,
                });
            }
        }

        if let Some(origin_id) = chosen {
            let confirmations = self.confirmations_for_change(&origin_id, existing.as_ref());
            return Some(Decision::ChangesToMake {
                origin_id,
                destination: resolvent.destination_type,
                confirmations,
                taken,
            });
        }

        if existing.is_none() && resolution.nothing_is_fine() {
            return Some(Decision::ExistingNoChange {
                existing_id: None,
                taken,
            });
        }

        None
    }

    /// Decide a resolvent constrained to nothing-installed
    fn decide_removal(&self, resolution: &Resolution, taken: bool) -> Option<Decision> {
        let resolvent = &resolution.resolvent;
        let installed = self.installed_ids_for(resolvent);

        if installed.is_empty() {
            return Some(Decision::ExistingNoChange {
                existing_id: None,
                taken,
            });
        }

        let removable = installed
            .iter()
            .all(|id| self.helpers.allowed_to_remove.allowed_to_remove(resolution, id));
        if !removable {
            return None;
        }

        let mut confirmations = Vec::new();
        let target_removal = resolution
            .constraints
            .iter()
            .any(|c| c.reason.is_target());
        if !target_removal && !self.permissions.permit_removal_of_used {
            confirmations.push(Confirmation::RemovalOfUsed);
        }

        Some(Decision::Remove {
            ids: installed,
            confirmations,
            taken,
        })
    }

    /// Confirmations a change decision still needs
    fn confirmations_for_change(
        &self,
        origin_id: &PackageId,
        existing: Option<&PackageId>,
    ) -> Vec<Confirmation> {
        let mut confirmations = Vec::new();
        if let Some(existing) = existing {
            if origin_id.version < existing.version && !self.permissions.permit_downgrade {
                confirmations.push(Confirmation::Downgrade);
            }
        }
        if origin_id.is_masked() && !self.permissions.permit_mask_override {
            confirmations.push(Confirmation::MaskOverride);
        }
        confirmations
    }

    /// The best installed id for a resolvent
    fn existing_id_for(&self, resolvent: &Resolvent) -> Option<PackageId> {
        self.installed_ids_for(resolvent).pop()
    }

    /// All installed ids for a resolvent, worst to best
    fn installed_ids_for(&self, resolvent: &Resolvent) -> Vec<PackageId> {
        let mut spec = PackageSpec::name_only(resolvent.package.clone());
        spec.slot = resolvent.slot.name().map(str::to_string);
        self.cache.perform_select(
            self.env,
            &Selection::AllVersionsSorted(
                Generator::matches(spec).filtered(Filter::Installed),
            ),
        )
    }

    /// Installable ids satisfying every constraint of a resolution
    fn installable_candidates_for(&self, resolution: &Resolution) -> Vec<PackageId> {
        let resolvent = &resolution.resolvent;
        let mut spec = PackageSpec::name_only(resolvent.package.clone());
        spec.slot = resolvent.slot.name().map(str::to_string);

        let generator = self.helpers.origin_filtered_generator.make_generator(
            Generator::matches(spec)
                .filtered(Filter::SupportsInstall)
                .filtered(self.helpers.unmaskable_filter.make_filter()),
        );

        self.cache
            .perform_select(self.env, &Selection::AllVersionsSorted(generator))
            .into_iter()
            .filter(|id| {
                resolution
                    .constraints
                    .iter()
                    .all(|c| c.spec.block || c.spec.matches(id))
            })
            .collect()
    }

    /// Candidates that exist but fail constraints, for reporting
    fn unsuitable_candidates_for(&self, resolution: &Resolution) -> Vec<UnsuitableCandidate> {
        let resolvent = &resolution.resolvent;
        let mut spec = PackageSpec::name_only(resolvent.package.clone());
        spec.slot = resolvent.slot.name().map(str::to_string);

        // Mask-permissive view so masked-but-matching ids get reported
        let all = self.cache.perform_select(
            self.env,
            &Selection::AllVersionsSorted(
                Generator::matches(spec).filtered(Filter::SupportsInstall),
            ),
        );

        all.into_iter()
            .map(|id| {
                let unmet: Vec<String> = resolution
                    .constraints
                    .iter()
                    .filter(|c| {
                        if c.spec.block {
                            c.spec.matches(&id)
                        } else {
                            !c.spec.matches(&id)
                        }
                    })
                    .map(|c| c.to_string())
                    .collect();
                let mut unmet = unmet;
                if id.is_masked() {
                    unmet.push("masked".to_string());
                }
                UnsuitableCandidate {
                    id,
                    unmet_constraints: unmet,
                }
            })
            .collect()
    }

    /// Installed slots a blocker spec names
    fn resolvents_for_blocker(&self, spec: &PackageSpec) -> Vec<Resolvent> {
        let mut name_spec = PackageSpec::name_only(spec.name.clone());
        name_spec.slot = spec.slot.clone();
        let installed = self.cache.perform_select(
            self.env,
            &Selection::BestVersionInEachSlot(
                Generator::matches(name_spec).filtered(Filter::Installed),
            ),
        );

        if installed.is_empty() {
            // Still record the blocker so it shows up as satisfied
            return vec![self.error_resolvent_for(spec)];
        }

        installed
            .into_iter()
            .map(|id| {
                Resolvent::new(
                    id.name.clone(),
                    SlotNameOrNull::slot(id.slot.clone()),
                    DestinationType::Install,
                )
            })
            .collect()
    }

    /// A resolvent for specs nothing matches, so failures are collected
    fn error_resolvent_for(&self, spec: &PackageSpec) -> Resolvent {
        let slot = match spec.slot {
            Some(ref s) => SlotNameOrNull::slot(s.clone()),
            None => SlotNameOrNull::unknown(),
        };
        Resolvent::new(spec.name.clone(), slot, DestinationType::Install)
    }

    /// Walk the decided id's dependencies, adding constraints and
    /// discovering new resolvents
    fn add_dependencies_if_necessary(&mut self, resolvent: &Resolvent) -> Result<ConstraintApplied> {
        let resolution = self
            .resolutions
            .get(resolvent)
            .expect("worklist entries have resolutions")
            .clone();

        let id = match &resolution.decision {
            Some(Decision::ChangesToMake { origin_id, .. }) => origin_id.clone(),
            Some(Decision::ExistingNoChange {
                existing_id: Some(id),
                ..
            }) => id.clone(),
            _ => return Ok(ConstraintApplied::Accepted),
        };

        for dep in id.dependencies.clone() {
            let interest = self.helpers.interest_in_spec.interest_in_spec(
                self.env,
                self.cache,
                &resolution,
                &id,
                &dep,
            );
            let untaken = match interest {
                SpecInterest::Ignore => continue,
                SpecInterest::Untaken => true,
                SpecInterest::Take | SpecInterest::TakeUnimportant => false,
            };

            let reason = Rc::new(Reason::Dependency {
                from_id: id.clone(),
                dep_kind: dep.kind,
            });

            if dep.spec.block {
                for dep_resolvent in self.resolvents_for_blocker(&dep.spec) {
                    let constraint = Constraint::new(
                        dep.spec.clone(),
                        Rc::clone(&reason),
                        dep_resolvent.destination_type,
                        UseExisting::IfPossible,
                    )
                    .with_untaken(untaken)
                    .with_nothing_is_fine_too(true);
                    if let ConstraintApplied::NeedsRestart(r) =
                        self.apply_constraint(&dep_resolvent, constraint)
                    {
                        return Ok(ConstraintApplied::NeedsRestart(r));
                    }
                }
                continue;
            }

            let (resolvents, _) = self.helpers.resolvents_for.resolvents_for(
                self.env,
                self.cache,
                &dep.spec,
                Some(&id),
                None,
                &reason,
            );

            if resolvents.is_empty() {
                if untaken {
                    continue;
                }
                let error_resolvent = self.error_resolvent_for(&dep.spec);
                let constraint = Constraint::new(
                    dep.spec.clone(),
                    Rc::clone(&reason),
                    error_resolvent.destination_type,
                    self.use_existing_for_dependencies,
                );
                if let ConstraintApplied::NeedsRestart(r) =
                    self.apply_constraint(&error_resolvent, constraint)
                {
                    return Ok(ConstraintApplied::NeedsRestart(r));
                }
                continue;
            }

            for dep_resolvent in resolvents {
                let constraint = Constraint::new(
                    dep.spec.clone(),
                    Rc::clone(&reason),
                    dep_resolvent.destination_type,
                    self.use_existing_for_dependencies,
                )
                .with_untaken(untaken);
                if let ConstraintApplied::NeedsRestart(r) =
                    self.apply_constraint(&dep_resolvent, constraint)
                {
                    return Ok(ConstraintApplied::NeedsRestart(r));
                }
            }
        }

        Ok(ConstraintApplied::Accepted)
    }

    /// Spawn binary-producing resolvents for decided changes that are
    /// routed via binaries; true when new work appeared
    fn add_via_binary_resolvents(&mut self) -> bool {
        let mut new_work = false;
        let snapshot = self.order.clone();

        for resolvent in snapshot {
            if resolvent.destination_type != DestinationType::Install {
                continue;
            }
            let Some(resolution) = self.resolutions.get(&resolvent) else {
                continue;
            };
            if !self.helpers.always_via_binary.always_via_binary(resolution) {
                continue;
            }

            let binary_resolvent = Resolvent::new(
                resolvent.package.clone(),
                resolvent.slot.clone(),
                DestinationType::CreateBinary,
            );
            if self.resolutions.contains_key(&binary_resolvent) {
                continue;
            }

            debug!("Routing {} via a binary build", resolvent);
            let binary_resolution = Resolution::new(binary_resolvent.clone());
            let constraints = self
                .helpers
                .constraints_for_via_binary
                .constraints_for(&binary_resolution, resolution);
            for constraint in constraints {
                self.apply_constraint_infallible(&binary_resolvent, constraint);
            }
            new_work = true;
        }

        new_work
    }
}
