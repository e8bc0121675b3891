// src/resolver/order.rs

//! Candidate ordering and plan ordering
//!
//! `PackageIdComparatorWithPromotion` is the total order used whenever
//! candidate ids are sorted during selection: name, then version; on
//! equal name and version a pre-built binary of the same release is
//! promoted ahead of its source form; otherwise repository registration
//! order breaks the tie, with a stable final fallback.
//!
//! Plan ordering walks taken change-or-remove decisions with Kahn's
//! algorithm so dependencies come before their dependents.

use super::decision::Decision;
use super::resolution::Resolution;
use super::resolvent::Resolvent;
use crate::env::Environment;
use crate::package::{OriginKind, PackageId};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// Sameness predicate: do two ids represent the same underlying release?
pub type SamenessFn<'a> = dyn Fn(&PackageId, &PackageId) -> bool + 'a;

/// Total order over candidate ids with binary promotion
pub struct PackageIdComparatorWithPromotion<'a> {
    env: &'a dyn Environment,
    sameness: Box<SamenessFn<'a>>,
}

impl<'a> PackageIdComparatorWithPromotion<'a> {
    /// Comparator with the default sameness predicate (same package,
    /// slot and upstream release)
    pub fn new(env: &'a dyn Environment) -> Self {
        Self {
            env,
            sameness: Box::new(|a, b| a.same_release_as(b)),
        }
    }

    /// Comparator with a custom sameness predicate
    pub fn with_sameness(
        env: &'a dyn Environment,
        sameness: impl Fn(&PackageId, &PackageId) -> bool + 'a,
    ) -> Self {
        Self {
            env,
            sameness: Box::new(sameness),
        }
    }

    /// Compare two ids; `Less` sorts ahead
    pub fn compare(&self, a: &PackageId, b: &PackageId) -> Ordering {
        match a.name.cmp(&b.name) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match a.version.cmp(&b.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Equal name and version: a binary build of the same release is
        // promoted ahead of its source form
        if (self.sameness)(a, b) {
            match (a.origin, b.origin) {
                (OriginKind::Binary, OriginKind::Source) => return Ordering::Less,
                (OriginKind::Source, OriginKind::Binary) => return Ordering::Greater,
                _ => {}
            }
        }

        match self
            .env
            .repository_index(&a.repository)
            .cmp(&self.env.repository_index(&b.repository))
        {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Stable final tie-break
        (a.origin, &a.repository, &a.slot).cmp(&(b.origin, &b.repository, &b.slot))
    }

    /// Sort ids into comparator order
    pub fn sort(&self, ids: &mut [PackageId]) {
        ids.sort_by(|a, b| self.compare(a, b));
    }

    /// The preferred candidate: highest version, promotion and
    /// repository order deciding among equals
    pub fn preferred<'b>(&self, ids: &'b [PackageId]) -> Option<&'b PackageId> {
        let best_version = ids.iter().map(|id| &id.version).max()?;
        ids.iter()
            .filter(|id| id.version == *best_version)
            .min_by(|a, b| self.compare(a, b))
    }
}

/// Order taken change-or-remove resolvents so dependencies precede
/// dependents
///
/// Edges are derived from the decided origins' dependency lists against
/// the other decided resolvents. Cycles are tolerated: members of a
/// cycle keep their discovery order.
pub fn sort_for_execution(
    order: &[Resolvent],
    resolutions: &HashMap<Resolvent, Resolution>,
) -> Vec<Resolvent> {
    let involved: Vec<&Resolvent> = order
        .iter()
        .filter(|r| {
            resolutions
                .get(r)
                .and_then(|res| res.decision.as_ref())
                .is_some_and(|d| d.is_change_or_remove() && d.is_taken())
        })
        .collect();

    let involved_set: HashSet<&Resolvent> = involved.iter().copied().collect();

    // dependency -> dependents edges
    let mut edges: HashMap<&Resolvent, Vec<&Resolvent>> = HashMap::new();
    let mut in_degree: HashMap<&Resolvent, usize> = involved.iter().map(|r| (*r, 0)).collect();

    for resolvent in &involved {
        let Some(resolution) = resolutions.get(*resolvent) else {
            continue;
        };
        let Some(Decision::ChangesToMake { origin_id, .. }) = &resolution.decision else {
            continue;
        };
        for dep in &origin_id.dependencies {
            for other in &involved {
                if *other == *resolvent || !dep.spec.matches_name(&other.package) {
                    continue;
                }
                if !involved_set.contains(*other) {
                    continue;
                }
                edges.entry(*other).or_default().push(*resolvent);
                *in_degree.entry(*resolvent).or_insert(0) += 1;
            }
        }
    }

    let mut queue: VecDeque<&Resolvent> = involved
        .iter()
        .filter(|r| in_degree.get(*r) == Some(&0))
        .copied()
        .collect();
    let mut result: Vec<Resolvent> = Vec::new();

    while let Some(resolvent) = queue.pop_front() {
        result.push(resolvent.clone());
        if let Some(dependents) = edges.get(resolvent) {
            for dependent in dependents {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if result.len() != involved.len() {
        // Cycle (e.g. mutual post dependencies): keep discovery order
        // for whatever could not be ordered
        warn!(
            "Dependency cycle among {} resolvents; keeping discovery order for the remainder",
            involved.len() - result.len()
        );
        let placed: HashSet<Resolvent> = result.iter().cloned().collect();
        for resolvent in involved {
            if !placed.contains(resolvent) {
                result.push(resolvent.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Repository, StandardEnvironment};
    use crate::name::QualifiedName;
    use crate::package::Dependency;
    use crate::resolver::resolvent::{DestinationType, SlotNameOrNull};
    use crate::spec::PackageSpec;
    use crate::version::PackageVersion;

    fn id(name: &str, version: &str, repo: &str, origin: OriginKind) -> PackageId {
        PackageId::new(
            QualifiedName::parse(name).unwrap(),
            PackageVersion::parse(version).unwrap(),
            "0",
            repo,
            origin,
        )
    }

    fn env() -> StandardEnvironment {
        let mut env = StandardEnvironment::new();
        env.register_repository(Repository::new("main"));
        env.register_repository(Repository::new("overlay"));
        env.register_repository(Repository::new("binhost"));
        env
    }

    #[test]
    fn test_name_then_version() {
        let env = env();
        let cmp = PackageIdComparatorWithPromotion::new(&env);
        assert_eq!(
            cmp.compare(
                &id("app/aa", "2.0", "main", OriginKind::Source),
                &id("app/bb", "1.0", "main", OriginKind::Source)
            ),
            Ordering::Less
        );
        assert_eq!(
            cmp.compare(
                &id("app/aa", "1.0", "main", OriginKind::Source),
                &id("app/aa", "2.0", "main", OriginKind::Source)
            ),
            Ordering::Less
        );
    }

    #[test]
    fn test_binary_promoted_over_source() {
        let env = env();
        let cmp = PackageIdComparatorWithPromotion::new(&env);
        let src = id("app/foo", "1.0", "main", OriginKind::Source);
        let bin = id("app/foo", "1.0", "binhost", OriginKind::Binary);
        assert_eq!(cmp.compare(&bin, &src), Ordering::Less);
        assert_eq!(cmp.compare(&src, &bin), Ordering::Greater);
    }

    #[test]
    fn test_repository_order_without_sameness() {
        let env = env();
        // A sameness predicate that never matches: repository
        // registration order decides instead
        let cmp = PackageIdComparatorWithPromotion::with_sameness(&env, |_, _| false);
        let a = id("app/foo", "1.0", "overlay", OriginKind::Source);
        let b = id("app/foo", "1.0", "main", OriginKind::Source);
        assert_eq!(cmp.compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_strict_weak_ordering_properties() {
        let env = env();
        let cmp = PackageIdComparatorWithPromotion::new(&env);
        let ids = [
            id("app/foo", "1.0", "main", OriginKind::Source),
            id("app/foo", "1.0", "binhost", OriginKind::Binary),
            id("app/foo", "2.0", "overlay", OriginKind::Source),
            id("app/bar", "1.0", "main", OriginKind::Source),
        ];

        // Irreflexive
        for a in &ids {
            assert_eq!(cmp.compare(a, a), Ordering::Equal);
        }
        // Antisymmetric
        for a in &ids {
            for b in &ids {
                assert_eq!(cmp.compare(a, b), cmp.compare(b, a).reverse());
            }
        }
        // Transitive over the full set
        let mut sorted: Vec<PackageId> = ids.to_vec();
        cmp.sort(&mut sorted);
        for window in sorted.windows(2) {
            assert_ne!(cmp.compare(&window[0], &window[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_preferred_picks_promoted_build_of_best_version() {
        let env = env();
        let cmp = PackageIdComparatorWithPromotion::new(&env);
        let ids = vec![
            id("app/foo", "1.0", "main", OriginKind::Source),
            id("app/foo", "2.0", "main", OriginKind::Source),
            id("app/foo", "2.0", "binhost", OriginKind::Binary),
        ];
        let preferred = cmp.preferred(&ids).unwrap();
        assert_eq!(preferred.origin, OriginKind::Binary);
        assert_eq!(preferred.version, PackageVersion::parse("2.0").unwrap());
    }

    #[test]
    fn test_sort_for_execution_dependencies_first() {
        let lib = Resolvent::new(
            QualifiedName::new("sys-libs", "zlib"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );
        let app = Resolvent::new(
            QualifiedName::new("app", "foo"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );

        let mut resolutions = HashMap::new();

        let mut lib_res = Resolution::new(lib.clone());
        lib_res.decision = Some(Decision::ChangesToMake {
            origin_id: id("sys-libs/zlib", "1.3", "main", OriginKind::Source),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        });
        resolutions.insert(lib.clone(), lib_res);

        let mut app_res = Resolution::new(app.clone());
        app_res.decision = Some(Decision::ChangesToMake {
            origin_id: id("app/foo", "1.0", "main", OriginKind::Source).with_dependency(
                Dependency::new(
                    PackageSpec::parse("sys-libs/zlib").unwrap(),
                    crate::package::DepKind::Run,
                ),
            ),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        });
        resolutions.insert(app.clone(), app_res);

        // Discovery order had the app first; execution order must not
        let order = vec![app.clone(), lib.clone()];
        let sorted = sort_for_execution(&order, &resolutions);
        assert_eq!(sorted, vec![lib, app]);
    }

    #[test]
    fn test_sort_for_execution_tolerates_cycles() {
        let a = Resolvent::new(
            QualifiedName::new("app", "aa"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );
        let b = Resolvent::new(
            QualifiedName::new("app", "bb"),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        );

        let mut resolutions = HashMap::new();
        let mut a_res = Resolution::new(a.clone());
        a_res.decision = Some(Decision::ChangesToMake {
            origin_id: id("app/aa", "1.0", "main", OriginKind::Source).with_dependency(
                Dependency::new(
                    PackageSpec::parse("app/bb").unwrap(),
                    crate::package::DepKind::Post,
                ),
            ),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        });
        resolutions.insert(a.clone(), a_res);

        let mut b_res = Resolution::new(b.clone());
        b_res.decision = Some(Decision::ChangesToMake {
            origin_id: id("app/bb", "1.0", "main", OriginKind::Source).with_dependency(
                Dependency::new(
                    PackageSpec::parse("app/aa").unwrap(),
                    crate::package::DepKind::Post,
                ),
            ),
            destination: DestinationType::Install,
            confirmations: Vec::new(),
            taken: true,
        });
        resolutions.insert(b.clone(), b_res);

        let order = vec![a.clone(), b.clone()];
        let sorted = sort_for_execution(&order, &resolutions);
        assert_eq!(sorted.len(), 2);
    }
}
