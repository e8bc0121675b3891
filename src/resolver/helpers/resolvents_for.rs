// src/resolver/helpers/resolvents_for.rs

//! Candidate discovery: which resolvents does a spec imply?

use crate::env::{Environment, Filter, Generator, Selection, SelectionCache};
use crate::package::PackageId;
use crate::resolver::reason::Reason;
use crate::resolver::resolvent::{DestinationType, Resolvent, SlotNameOrNull};
use crate::spec::PackageSpec;
use tracing::debug;

/// Turns a spec plus its reason into concrete resolvents
///
/// Two policies combine here: the destination-type policy (where should
/// matches of this spec go, given why we are looking at it) and the
/// slot policy (best slot, installed slots, or fallback between them,
/// configured separately for targets and for everything else).
#[derive(Debug)]
pub struct GetResolventsForHelper {
    target_destination_type: DestinationType,

    want_target_dependencies: bool,
    want_target_runtime_dependencies: bool,

    want_dependencies_on_live: bool,
    want_runtime_dependencies_on_live: bool,

    want_best_slot_for_targets: bool,
    want_installed_slots_for_targets: bool,
    fallback_to_other_slots_for_targets: bool,

    want_best_slot_otherwise: bool,
    want_installed_slots_otherwise: bool,
    fallback_to_other_slots_otherwise: bool,
}

impl GetResolventsForHelper {
    pub fn new() -> Self {
        Self {
            target_destination_type: DestinationType::Install,
            want_target_dependencies: true,
            want_target_runtime_dependencies: true,
            want_dependencies_on_live: true,
            want_runtime_dependencies_on_live: true,
            want_best_slot_for_targets: true,
            want_installed_slots_for_targets: true,
            fallback_to_other_slots_for_targets: false,
            want_best_slot_otherwise: true,
            want_installed_slots_otherwise: true,
            fallback_to_other_slots_otherwise: false,
        }
    }

    pub fn set_target_destination_type(&mut self, v: DestinationType) {
        self.target_destination_type = v;
    }

    pub fn set_want_target_dependencies(&mut self, b: bool) {
        self.want_target_dependencies = b;
    }

    pub fn set_want_target_runtime_dependencies(&mut self, b: bool) {
        self.want_target_runtime_dependencies = b;
    }

    pub fn set_want_dependencies_on_live(&mut self, b: bool) {
        self.want_dependencies_on_live = b;
    }

    pub fn set_want_runtime_dependencies_on_live(&mut self, b: bool) {
        self.want_runtime_dependencies_on_live = b;
    }

    /// Slot policy for non-target specs
    pub fn set_slots(&mut self, best: bool, installed: bool, fallback: bool) {
        self.want_best_slot_otherwise = best;
        self.want_installed_slots_otherwise = installed;
        self.fallback_to_other_slots_otherwise = fallback;
    }

    /// Slot policy for target specs
    pub fn set_target_slots(&mut self, best: bool, installed: bool, fallback: bool) {
        self.want_best_slot_for_targets = best;
        self.want_installed_slots_for_targets = installed;
        self.fallback_to_other_slots_for_targets = fallback;
    }

    /// Destination types implied by a reason for one candidate id
    fn destination_types_for(&self, reason: &Reason, id: &PackageId) -> Vec<DestinationType> {
        match reason {
            Reason::Target { .. } => vec![self.target_destination_type],
            Reason::Dependent { .. } | Reason::WasUsedBy { .. } => vec![DestinationType::Install],
            Reason::ViaBinary { .. } | Reason::Preset => Vec::new(),
            Reason::Dependency { dep_kind, .. } => {
                let mut result = Vec::new();

                if self.target_destination_type == DestinationType::CreateBinary {
                    let binary_if_possible = self.want_target_dependencies
                        || (self.want_target_runtime_dependencies && dep_kind.is_run_or_post());
                    if binary_if_possible && id.binary_buildable {
                        result.push(DestinationType::CreateBinary);
                    }
                }

                let on_live = if self.want_runtime_dependencies_on_live
                    ^ self.want_dependencies_on_live
                {
                    (self.want_dependencies_on_live && !dep_kind.is_run_or_post())
                        || (self.want_runtime_dependencies_on_live && dep_kind.is_run_or_post())
                } else {
                    self.want_runtime_dependencies_on_live || self.want_dependencies_on_live
                };
                if on_live {
                    result.push(DestinationType::Install);
                }

                result
            }
            Reason::Set { wrapped, .. } | Reason::LikeOtherDestinationType { wrapped, .. } => {
                self.destination_types_for(wrapped, id)
            }
        }
    }

    /// All `(package, slot, destination)` combinations a spec implies
    ///
    /// Returns the resolvents plus a flag recording whether the spec or
    /// slot hint narrowed the result set (diagnostics only).
    pub fn resolvents_for(
        &self,
        env: &dyn Environment,
        cache: &SelectionCache,
        spec: &PackageSpec,
        from_id: Option<&PackageId>,
        slot_hint: Option<&SlotNameOrNull>,
        reason: &Reason,
    ) -> (Vec<Resolvent>, bool) {
        debug!(
            "Finding resolvents for '{}' (from {:?})",
            spec,
            from_id.map(|id| id.to_string())
        );

        let slot_restriction = slot_hint
            .and_then(|s| s.name().map(str::to_string))
            .or_else(|| spec.slot.clone());

        let mut best_generator = Generator::matches(spec.clone())
            .filtered(Filter::SupportsInstall)
            .filtered(Filter::NotMasked);
        if let Some(ref slot) = slot_restriction {
            best_generator = best_generator.filtered(Filter::Slot(slot.clone()));
        }
        let best = cache
            .perform_select(env, &Selection::BestVersionOnly(best_generator))
            .pop();

        let installed_ids = cache.perform_select(
            env,
            &Selection::BestVersionInEachSlot(
                Generator::matches(spec.clone()).filtered(Filter::Installed),
            ),
        );

        let target = reason.is_target();
        let want_installed = if target {
            self.want_installed_slots_for_targets
        } else {
            self.want_installed_slots_otherwise
        };
        let want_best = if target {
            self.want_best_slot_for_targets
        } else {
            self.want_best_slot_otherwise
        };
        let fallback = if target {
            self.fallback_to_other_slots_for_targets
        } else {
            self.fallback_to_other_slots_otherwise
        };

        let already_installed = |best: &PackageId| {
            installed_ids.iter().any(|i| i.same_release_as(best))
        };

        let mut result_ids: Vec<PackageId> = Vec::new();
        match best {
            None => result_ids.extend(installed_ids.iter().cloned()),
            Some(best) => {
                if want_best && fallback && !want_installed {
                    if !already_installed(&best) {
                        result_ids.push(best);
                    } else {
                        result_ids.extend(installed_ids.iter().cloned());
                    }
                } else if want_installed && fallback && !want_best {
                    if installed_ids.is_empty() {
                        result_ids.push(best);
                    } else {
                        result_ids.extend(installed_ids.iter().cloned());
                    }
                } else if want_installed && want_best {
                    if !already_installed(&best) {
                        result_ids.push(best);
                    }
                    result_ids.extend(installed_ids.iter().cloned());
                } else if want_best {
                    result_ids.push(best);
                } else if want_installed {
                    result_ids.extend(installed_ids.iter().cloned());
                }
            }
        }

        let mut resolvents = Vec::new();
        for id in &result_ids {
            for destination_type in self.destination_types_for(reason, id) {
                let resolvent = Resolvent::new(
                    id.name.clone(),
                    SlotNameOrNull::slot(id.slot.clone()),
                    destination_type,
                );
                if !resolvents.contains(&resolvent) {
                    resolvents.push(resolvent);
                }
            }
        }

        let was_narrowed = spec.is_narrowing() || slot_restriction.is_some();
        (resolvents, was_narrowed)
    }
}

impl Default for GetResolventsForHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Repository, StandardEnvironment};
    use crate::name::QualifiedName;
    use crate::package::OriginKind;
    use crate::version::PackageVersion;

    fn id(name: &str, version: &str, slot: &str, origin: OriginKind) -> PackageId {
        let repo = match origin {
            OriginKind::Installed => "installed",
            _ => "main",
        };
        PackageId::new(
            QualifiedName::parse(name).unwrap(),
            PackageVersion::parse(version).unwrap(),
            slot,
            repo,
            origin,
        )
    }

    fn env_with(available: Vec<PackageId>, installed: Vec<PackageId>) -> StandardEnvironment {
        let mut env = StandardEnvironment::new();
        let mut repo = Repository::new("main");
        for pkg in available {
            repo = repo.with_package(pkg);
        }
        env.register_repository(repo);
        for pkg in installed {
            env.add_installed(pkg);
        }
        env
    }

    fn target_reason(spec: &str) -> Reason {
        Reason::Target {
            spec: PackageSpec::parse(spec).unwrap(),
        }
    }

    #[test]
    fn test_target_spec_with_slot() {
        // Spec 'app/foo:0' as an install target yields exactly one
        // resolvent, and the slot restriction narrows
        let env = env_with(vec![id("app/foo", "1.0", "0", OriginKind::Source)], vec![]);
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("app/foo:0").unwrap();
        let (resolvents, was_narrowed) =
            helper.resolvents_for(&env, &cache, &spec, None, None, &target_reason("app/foo:0"));

        assert_eq!(
            resolvents,
            vec![Resolvent::new(
                QualifiedName::new("app", "foo"),
                SlotNameOrNull::slot("0"),
                DestinationType::Install,
            )]
        );
        assert!(was_narrowed);
    }

    #[test]
    fn test_bare_spec_does_not_narrow() {
        let env = env_with(vec![id("app/foo", "1.0", "0", OriginKind::Source)], vec![]);
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("app/foo").unwrap();
        let (resolvents, was_narrowed) =
            helper.resolvents_for(&env, &cache, &spec, None, None, &target_reason("app/foo"));

        assert_eq!(resolvents.len(), 1);
        assert!(!was_narrowed);
    }

    #[test]
    fn test_installed_slots_included_for_upgrades() {
        // Best version in a new slot plus an installed older slot: both
        // slots get resolvents under the default policy
        let env = env_with(
            vec![id("sys-libs/db", "5.3", "5.3", OriginKind::Source)],
            vec![id("sys-libs/db", "4.8", "4.8", OriginKind::Installed)],
        );
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("sys-libs/db").unwrap();
        let (resolvents, _) =
            helper.resolvents_for(&env, &cache, &spec, None, None, &target_reason("sys-libs/db"));

        assert_eq!(resolvents.len(), 2);
        let slots: Vec<_> = resolvents.iter().filter_map(|r| r.slot.name()).collect();
        assert!(slots.contains(&"5.3"));
        assert!(slots.contains(&"4.8"));
    }

    #[test]
    fn test_best_slot_only_policy() {
        let env = env_with(
            vec![id("sys-libs/db", "5.3", "5.3", OriginKind::Source)],
            vec![id("sys-libs/db", "4.8", "4.8", OriginKind::Installed)],
        );
        let mut helper = GetResolventsForHelper::new();
        helper.set_target_slots(true, false, false);
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("sys-libs/db").unwrap();
        let (resolvents, _) =
            helper.resolvents_for(&env, &cache, &spec, None, None, &target_reason("sys-libs/db"));

        assert_eq!(resolvents.len(), 1);
        assert_eq!(resolvents[0].slot, SlotNameOrNull::slot("5.3"));
    }

    #[test]
    fn test_slot_hint_overrides() {
        let env = env_with(
            vec![
                id("app/foo", "1.0", "0", OriginKind::Source),
                id("app/foo", "2.0", "1", OriginKind::Source),
            ],
            vec![],
        );
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("app/foo").unwrap();
        let hint = SlotNameOrNull::slot("0");
        let (resolvents, was_narrowed) = helper.resolvents_for(
            &env,
            &cache,
            &spec,
            None,
            Some(&hint),
            &target_reason("app/foo"),
        );

        assert_eq!(resolvents.len(), 1);
        assert_eq!(resolvents[0].slot, SlotNameOrNull::slot("0"));
        assert!(was_narrowed);
    }

    #[test]
    fn test_via_binary_reason_yields_nothing() {
        let env = env_with(vec![id("app/foo", "1.0", "0", OriginKind::Source)], vec![]);
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("app/foo").unwrap();
        let reason = Reason::ViaBinary {
            other_resolvent: Resolvent::new(
                QualifiedName::new("app", "other"),
                SlotNameOrNull::slot("0"),
                DestinationType::Install,
            ),
        };
        let (resolvents, _) = helper.resolvents_for(&env, &cache, &spec, None, None, &reason);
        assert!(resolvents.is_empty());
    }

    #[test]
    fn test_binary_target_adds_binary_destination_for_deps() {
        let mut helper = GetResolventsForHelper::new();
        helper.set_target_destination_type(DestinationType::CreateBinary);
        let env = env_with(vec![id("app/dep", "1.0", "0", OriginKind::Source)], vec![]);
        let cache = SelectionCache::new();

        let from = id("app/foo", "1.0", "0", OriginKind::Source);
        let reason = Reason::Dependency {
            from_id: from.clone(),
            dep_kind: crate::package::DepKind::Run,
        };
        let spec = PackageSpec::parse("app/dep").unwrap();
        let (resolvents, _) =
            helper.resolvents_for(&env, &cache, &spec, Some(&from), None, &reason);

        let destinations: Vec<_> = resolvents.iter().map(|r| r.destination_type).collect();
        assert!(destinations.contains(&DestinationType::CreateBinary));
        assert!(destinations.contains(&DestinationType::Install));
    }

    #[test]
    fn test_masked_best_falls_back_to_installed() {
        use crate::package::{Mask, MaskKind};
        let env = env_with(
            vec![
                id("app/foo", "2.0", "0", OriginKind::Source)
                    .with_mask(Mask::new(MaskKind::Keyword, "~amd64")),
            ],
            vec![id("app/foo", "1.0", "0", OriginKind::Installed)],
        );
        let helper = GetResolventsForHelper::new();
        let cache = SelectionCache::new();

        let spec = PackageSpec::parse("app/foo").unwrap();
        let (resolvents, _) =
            helper.resolvents_for(&env, &cache, &spec, None, None, &target_reason("app/foo"));

        // The masked best is not a candidate; the installed slot is
        assert_eq!(resolvents.len(), 1);
        assert_eq!(resolvents[0].slot, SlotNameOrNull::slot("0"));
    }
}
