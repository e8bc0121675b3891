// src/resolver/engine.rs

//! The resolution driver
//!
//! The driver owns the helper set and the restart protocol: it runs a
//! decider pass over the targets, and when the pass asks for a restart
//! it feeds the suggested preset into the initial-constraints helper,
//! throws the whole pass away, and runs again. A configurable cap
//! bounds the number of restarts; exhausting it is fatal.

use super::constraint::UseExisting;
use super::decider::{Decider, PassOutcome, Permissions};
use super::helpers::Helpers;
use super::resolved::Resolved;
use super::restart::SuggestRestart;
use crate::env::{Environment, SelectionCache};
use crate::error::{Error, Result};
use crate::spec::PackageSpec;
use tracing::{debug, info};

/// Default restart cap; far more restarts than any sane graph needs
pub const DEFAULT_RESTART_CAP: u32 = 64;

/// The top-level resolver
pub struct Resolver<'a> {
    env: &'a dyn Environment,
    helpers: Helpers,
    permissions: Permissions,
    use_existing_for_targets: UseExisting,
    use_existing_for_dependencies: UseExisting,
    restart_cap: u32,
    targets: Vec<PackageSpec>,
    restarts: Vec<SuggestRestart>,
}

impl<'a> Resolver<'a> {
    pub fn new(env: &'a dyn Environment, helpers: Helpers) -> Self {
        Self {
            env,
            helpers,
            permissions: Permissions::default(),
            use_existing_for_targets: UseExisting::IfPossible,
            use_existing_for_dependencies: UseExisting::IfPossible,
            restart_cap: DEFAULT_RESTART_CAP,
            targets: Vec::new(),
            restarts: Vec::new(),
        }
    }

    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
    }

    pub fn set_use_existing_for_targets(&mut self, v: UseExisting) {
        self.use_existing_for_targets = v;
    }

    pub fn set_use_existing_for_dependencies(&mut self, v: UseExisting) {
        self.use_existing_for_dependencies = v;
    }

    pub fn set_restart_cap(&mut self, cap: u32) {
        self.restart_cap = cap;
    }

    /// Add one target spec (a blocker spec requests removal)
    pub fn add_target(&mut self, spec: PackageSpec) {
        self.targets.push(spec);
    }

    /// The restarts the last `resolve` call went through
    pub fn restarts(&self) -> &[SuggestRestart] {
        &self.restarts
    }

    /// Resolve all targets into a finished plan
    pub fn resolve(&mut self) -> Result<Resolved> {
        let cache = SelectionCache::new();
        self.restarts.clear();

        loop {
            let mut decider = Decider::new(
                self.env,
                &cache,
                &self.helpers,
                self.permissions,
                self.use_existing_for_targets,
                self.use_existing_for_dependencies,
            );

            for target in &self.targets {
                decider.add_target(target)?;
            }

            match decider.resolve()? {
                PassOutcome::Finished => {
                    let (order, resolutions) = decider.into_resolutions();
                    info!(
                        "Resolved {} resolvents after {} restarts",
                        order.len(),
                        self.restarts.len()
                    );
                    return Ok(Resolved::assemble(&order, &resolutions));
                }
                PassOutcome::Restart(restart) => {
                    debug!("Pass suggested restart: {}", restart);
                    self.restarts.push(*restart.clone());
                    if self.restarts.len() as u32 > self.restart_cap {
                        return Err(Error::RestartCapExceeded {
                            count: self.restarts.len() as u32,
                            cap: self.restart_cap,
                        });
                    }
                    self.helpers
                        .initial_constraints
                        .add_suggested_restart(&restart);
                }
            }
        }
    }
}
