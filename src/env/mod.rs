// src/env/mod.rs

//! The resolver's view of the outside world
//!
//! An `Environment` answers candidate queries (composed from a
//! generator plus filters), reports mask reasons, and exposes the
//! stable repository registration order that candidate sorting ties
//! back to. `StandardEnvironment` backs the installed side with the
//! SQLite store and the available side with registered in-memory
//! repositories.
//!
//! Selection results are memoised in a mutex-guarded cache: computed
//! under lock on first use of a key, cloned out afterwards.

use crate::db::models::{InstalledPackage, RepositoryEntry};
use crate::error::Result;
use crate::name::QualifiedName;
use crate::package::{Mask, OriginKind, PackageId};
use crate::spec::PackageSpec;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tracing::debug;

/// A candidate filter, composable onto a generator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Accept everything
    All,
    /// Reject ids with any mask
    NotMasked,
    /// Reject only strongly masked ids (repository/profile masks)
    NotStronglyMasked,
    /// Accept ids that can be merged (source or binary, not installed rows)
    SupportsInstall,
    /// Accept only the named slot
    Slot(String),
    /// Accept only installed-database ids
    Installed,
    /// Reject pre-built binary ids
    NotBinary,
}

impl Filter {
    /// Test one id against this filter
    pub fn accepts(&self, id: &PackageId) -> bool {
        match self {
            Filter::All => true,
            Filter::NotMasked => !id.is_masked(),
            Filter::NotStronglyMasked => !id.is_strongly_masked(),
            Filter::SupportsInstall => id.origin != OriginKind::Installed,
            Filter::Slot(slot) => id.slot == *slot,
            Filter::Installed => id.origin == OriginKind::Installed,
            Filter::NotBinary => id.origin != OriginKind::Binary,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::NotMasked => write!(f, "not-masked"),
            Filter::NotStronglyMasked => write!(f, "not-strongly-masked"),
            Filter::SupportsInstall => write!(f, "supports-install"),
            Filter::Slot(s) => write!(f, "slot:{}", s),
            Filter::Installed => write!(f, "installed"),
            Filter::NotBinary => write!(f, "not-binary"),
        }
    }
}

/// A candidate generator: which ids to consider at all
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generator {
    /// Spec the candidates must match
    pub spec: PackageSpec,
}

impl Generator {
    pub fn matches(spec: PackageSpec) -> Self {
        Self { spec }
    }

    /// Compose a filter onto this generator
    pub fn filtered(self, filter: Filter) -> FilteredGenerator {
        FilteredGenerator {
            generator: self,
            filters: vec![filter],
        }
    }

    /// Wrap with no filters
    pub fn unfiltered(self) -> FilteredGenerator {
        FilteredGenerator {
            generator: self,
            filters: Vec::new(),
        }
    }
}

/// A generator with zero or more filters applied
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilteredGenerator {
    pub generator: Generator,
    pub filters: Vec<Filter>,
}

impl FilteredGenerator {
    /// Compose one more filter
    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    fn accepts(&self, id: &PackageId) -> bool {
        self.filters.iter().all(|f| f.accepts(id))
    }
}

/// How many of the matching ids to keep
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    /// All versions, worst to best
    AllVersionsSorted(FilteredGenerator),
    /// The single best version
    BestVersionOnly(FilteredGenerator),
    /// The best version in every slot that has one
    BestVersionInEachSlot(FilteredGenerator),
    /// Any one matching version
    SomeArbitraryVersion(FilteredGenerator),
}

impl Selection {
    fn filtered_generator(&self) -> &FilteredGenerator {
        match self {
            Selection::AllVersionsSorted(fg)
            | Selection::BestVersionOnly(fg)
            | Selection::BestVersionInEachSlot(fg)
            | Selection::SomeArbitraryVersion(fg) => fg,
        }
    }

    /// Stable cache key for this selection
    pub fn cache_key(&self) -> String {
        let kind = match self {
            Selection::AllVersionsSorted(_) => "all",
            Selection::BestVersionOnly(_) => "best",
            Selection::BestVersionInEachSlot(_) => "best-in-slot",
            Selection::SomeArbitraryVersion(_) => "some",
        };
        let fg = self.filtered_generator();
        let mut key = format!("{}|{}", kind, fg.generator.spec);
        for f in &fg.filters {
            key.push('|');
            key.push_str(&f.to_string());
        }
        key
    }
}

/// The resolver's world: candidates, masks, repository order
pub trait Environment {
    /// Every id (available and installed) matching the spec's name
    fn candidates(&self, name: &QualifiedName) -> Vec<PackageId>;

    /// Repository names in registration order
    fn repository_order(&self) -> &[String];

    /// Mask reasons for an id
    fn mask_reasons(&self, id: &PackageId) -> Vec<Mask> {
        id.masks.clone()
    }

    /// Registration index of a repository; unknown repositories sort last
    fn repository_index(&self, name: &str) -> usize {
        self.repository_order()
            .iter()
            .position(|r| r == name)
            .unwrap_or(usize::MAX)
    }

    /// Run a selection against this environment
    ///
    /// Candidates are ordered worst-to-best: by version, then by
    /// repository registration (earlier registration preferred on
    /// version ties).
    fn select(&self, selection: &Selection) -> Vec<PackageId> {
        let fg = selection.filtered_generator();
        let spec = &fg.generator.spec;

        let mut ids: Vec<PackageId> = self
            .candidates(&spec.name)
            .into_iter()
            .filter(|id| spec.matches(id))
            .filter(|id| fg.accepts(id))
            .collect();

        ids.sort_by(|a, b| {
            a.version.cmp(&b.version).then_with(|| {
                // Earlier-registered repository is better, so sorts later
                self.repository_index(&b.repository).cmp(&self.repository_index(&a.repository))
            })
        });

        match selection {
            Selection::AllVersionsSorted(_) => ids,
            Selection::BestVersionOnly(_) => ids.pop().into_iter().collect(),
            Selection::SomeArbitraryVersion(_) => ids.pop().into_iter().collect(),
            Selection::BestVersionInEachSlot(_) => {
                let mut best_in_slot: HashMap<String, PackageId> = HashMap::new();
                for id in ids {
                    // Ascending order: later entries replace earlier ones
                    best_in_slot.insert(id.slot.clone(), id);
                }
                let mut result: Vec<PackageId> = best_in_slot.into_values().collect();
                result.sort();
                result
            }
        }
    }
}

/// One registered repository of available packages
#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub packages: Vec<PackageId>,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    pub fn with_package(mut self, id: PackageId) -> Self {
        self.packages.push(id);
        self
    }
}

/// The standard environment: registered repositories plus the
/// installed-package database
pub struct StandardEnvironment {
    repositories: Vec<Repository>,
    repository_names: Vec<String>,
    installed: Vec<PackageId>,
}

impl StandardEnvironment {
    /// Build an environment with no repositories and nothing installed
    pub fn new() -> Self {
        Self {
            repositories: Vec::new(),
            repository_names: Vec::new(),
            installed: Vec::new(),
        }
    }

    /// Load the installed side from the database
    pub fn from_db(conn: &Connection) -> Result<Self> {
        let mut env = Self::new();
        for repo in RepositoryEntry::list_all(conn)? {
            env.register_repository(Repository::new(repo.name));
        }
        for pkg in InstalledPackage::list_all(conn)? {
            env.installed.push(pkg.to_package_id(conn)?);
        }
        debug!(
            "Loaded environment: {} repositories, {} installed packages",
            env.repositories.len(),
            env.installed.len()
        );
        Ok(env)
    }

    /// Register a repository; registration order is the tie-break order
    pub fn register_repository(&mut self, repository: Repository) {
        self.repository_names.push(repository.name.clone());
        self.repositories.push(repository);
    }

    /// Record an installed package directly (tests, adoption)
    pub fn add_installed(&mut self, id: PackageId) {
        self.installed.push(id);
    }

    /// All installed ids
    pub fn installed(&self) -> &[PackageId] {
        &self.installed
    }
}

impl Default for StandardEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for StandardEnvironment {
    fn candidates(&self, name: &QualifiedName) -> Vec<PackageId> {
        let mut result = Vec::new();
        for repo in &self.repositories {
            for id in &repo.packages {
                if id.name == *name {
                    result.push(id.clone());
                }
            }
        }
        for id in &self.installed {
            if id.name == *name {
                result.push(id.clone());
            }
        }
        result
    }

    fn repository_order(&self) -> &[String] {
        &self.repository_names
    }
}

/// Memoised selection results for one resolution run
///
/// The lock is held across a miss's compute so each key is computed at
/// most once; hits clone the cached ids.
pub struct SelectionCache {
    entries: Mutex<HashMap<String, Vec<PackageId>>>,
    computes: AtomicUsize,
}

impl SelectionCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            computes: AtomicUsize::new(0),
        }
    }

    /// Run a selection through the cache
    pub fn perform_select(&self, env: &dyn Environment, selection: &Selection) -> Vec<PackageId> {
        let key = selection.cache_key();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ids) = entries.get(&key) {
            return ids.clone();
        }
        let ids = env.select(selection);
        self.computes.fetch_add(1, AtomicOrdering::Relaxed);
        entries.insert(key, ids.clone());
        ids
    }

    /// How many selections were actually computed (not served from cache)
    pub fn computes(&self) -> usize {
        self.computes.load(AtomicOrdering::Relaxed)
    }
}

impl Default for SelectionCache {
    fn default() -> Self {
        Self::new()
    }
}
