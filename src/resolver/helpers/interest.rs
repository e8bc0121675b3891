// src/resolver/helpers/interest.rs

//! How much do we care about one dependency spec?

use crate::env::{Environment, Filter, Generator, Selection, SelectionCache};
use crate::package::{DepKind, Dependency, PackageId};
use crate::resolver::decision::Decision;
use crate::resolver::resolution::Resolution;
use crate::spec::PackageSpec;
use std::collections::HashSet;

/// The driver's level of interest in following a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecInterest {
    /// Follow it
    Take,
    /// Follow it, but only because it happens to be satisfied already
    TakeUnimportant,
    /// Optional and not taken; record it as such
    Untaken,
    /// Do not follow it at all
    Ignore,
}

/// Decides interest in dependency specs from configured policy
///
/// Hard dependencies of a change are always taken. Suggestions and
/// recommendations run through take/ignore lists (by spec, by
/// originating package, by annotation group), then the configured
/// tri-states, then an already-installed check.
#[derive(Debug)]
pub struct InterestInSpecHelper {
    take_specs: Vec<PackageSpec>,
    take_groups: HashSet<String>,
    take_from_specs: Vec<PackageSpec>,
    ignore_specs: Vec<PackageSpec>,
    ignore_groups: HashSet<String>,
    ignore_from_specs: Vec<PackageSpec>,
    no_dependencies_from_specs: Vec<PackageSpec>,
    no_blockers_from_specs: Vec<PackageSpec>,
    follow_installed_dependencies: bool,
    follow_installed_build_dependencies: bool,
    /// None is indeterminate: fall through to the installed check
    take_suggestions: Option<bool>,
    take_recommendations: Option<bool>,
}

impl InterestInSpecHelper {
    pub fn new() -> Self {
        Self {
            take_specs: Vec::new(),
            take_groups: HashSet::new(),
            take_from_specs: Vec::new(),
            ignore_specs: Vec::new(),
            ignore_groups: HashSet::new(),
            ignore_from_specs: Vec::new(),
            no_dependencies_from_specs: Vec::new(),
            no_blockers_from_specs: Vec::new(),
            follow_installed_dependencies: true,
            follow_installed_build_dependencies: false,
            take_suggestions: None,
            take_recommendations: Some(true),
        }
    }

    pub fn add_take_spec(&mut self, spec: PackageSpec) {
        self.take_specs.push(spec);
    }

    pub fn add_take_group(&mut self, group: impl Into<String>) {
        self.take_groups.insert(group.into());
    }

    pub fn add_take_from_spec(&mut self, spec: PackageSpec) {
        self.take_from_specs.push(spec);
    }

    pub fn add_ignore_spec(&mut self, spec: PackageSpec) {
        self.ignore_specs.push(spec);
    }

    pub fn add_ignore_group(&mut self, group: impl Into<String>) {
        self.ignore_groups.insert(group.into());
    }

    pub fn add_ignore_from_spec(&mut self, spec: PackageSpec) {
        self.ignore_from_specs.push(spec);
    }

    pub fn add_no_dependencies_from_spec(&mut self, spec: PackageSpec) {
        self.no_dependencies_from_specs.push(spec);
    }

    pub fn add_no_blockers_from_spec(&mut self, spec: PackageSpec) {
        self.no_blockers_from_specs.push(spec);
    }

    pub fn set_follow_installed_dependencies(&mut self, b: bool) {
        self.follow_installed_dependencies = b;
    }

    pub fn set_follow_installed_build_dependencies(&mut self, b: bool) {
        self.follow_installed_build_dependencies = b;
    }

    pub fn set_take_suggestions(&mut self, v: Option<bool>) {
        self.take_suggestions = v;
    }

    pub fn set_take_recommendations(&mut self, v: Option<bool>) {
        self.take_recommendations = v;
    }

    /// Specs from this id contribute no dependencies or blockers
    fn ignore_dep_from(&self, id: &PackageId, is_block: bool) -> bool {
        let list = if is_block {
            &self.no_blockers_from_specs
        } else {
            &self.no_dependencies_from_specs
        };
        list.iter().any(|spec| spec.matches(id))
    }

    /// Does the resolution's decision make us care about this dep at all?
    fn care_about_dep(&self, resolution: &Resolution, dep: &Dependency) -> bool {
        match &resolution.decision {
            Some(Decision::ExistingNoChange {
                existing_id: Some(existing),
                ..
            }) => {
                if self.ignore_dep_from(existing, dep.spec.block) {
                    return false;
                }
                if !self.follow_installed_build_dependencies && dep.kind == DepKind::Build {
                    return false;
                }
                if !self.follow_installed_dependencies && dep.kind != DepKind::Build {
                    return false;
                }
                // Optional deps of an already-installed package are only
                // interesting when already met; the caller's installed
                // check handles that, blocks are never interesting here
                !(dep.kind.is_optional() && dep.spec.block)
            }
            Some(Decision::ChangesToMake { origin_id, .. }) => {
                !self.ignore_dep_from(origin_id, dep.spec.block)
            }
            // Might have gone from a sensible decision to unable later on
            Some(Decision::UnableToMake { .. }) => false,
            // Nothing-installed and removal decisions carry no deps
            _ => false,
        }
    }

    /// Decide interest in one dependency of `id` under `resolution`
    pub fn interest_in_spec(
        &self,
        env: &dyn Environment,
        cache: &SelectionCache,
        resolution: &Resolution,
        id: &PackageId,
        dep: &Dependency,
    ) -> SpecInterest {
        if !self.care_about_dep(resolution, dep) {
            return SpecInterest::Ignore;
        }

        if !dep.kind.is_optional() {
            return SpecInterest::Take;
        }

        if self
            .take_specs
            .iter()
            .any(|spec| spec.matches_name(&dep.spec.name))
        {
            return SpecInterest::Take;
        }

        if self.take_from_specs.iter().any(|spec| spec.matches(id)) {
            return SpecInterest::Take;
        }

        if let Some(ref group) = dep.group {
            if self.take_groups.contains(group) {
                return SpecInterest::Take;
            }
        }

        if self
            .ignore_specs
            .iter()
            .any(|spec| spec.matches_name(&dep.spec.name))
        {
            return SpecInterest::Ignore;
        }

        if self.ignore_from_specs.iter().any(|spec| spec.matches(id)) {
            return SpecInterest::Ignore;
        }

        if let Some(ref group) = dep.group {
            if self.ignore_groups.contains(group) {
                return SpecInterest::Ignore;
            }
        }

        let tri = match dep.kind {
            DepKind::Suggestion => self.take_suggestions,
            DepKind::Recommendation => self.take_recommendations,
            _ => None,
        };
        match tri {
            Some(true) => return SpecInterest::Take,
            Some(false) => return SpecInterest::Ignore,
            None => {}
        }

        // Suggestions already installed are kept, but carry no weight
        let installed = cache.perform_select(
            env,
            &Selection::SomeArbitraryVersion(
                Generator::matches(dep.spec.clone()).filtered(Filter::Installed),
            ),
        );
        if !installed.is_empty() {
            return SpecInterest::TakeUnimportant;
        }

        SpecInterest::Untaken
    }
}

impl Default for InterestInSpecHelper {
    fn default() -> Self {
        Self::new()
    }
}
