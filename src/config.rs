// src/config.rs

//! Resolver run configuration
//!
//! Configuration is a TOML file deserialised into `ResolverConfig`,
//! then compiled into the helper set. Compiling parses every spec
//! string in the allow/ignore lists; an unparsable spec aborts the run
//! immediately instead of being collected like an ordinary resolution
//! failure.

use crate::error::{Error, Result};
use crate::resolver::decider::Permissions;
use crate::resolver::engine::DEFAULT_RESTART_CAP;
use crate::resolver::helpers::Helpers;
use crate::resolver::{DestinationType, UseExisting};
use crate::spec::PackageSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub resolution: ResolutionSection,
    pub permits: PermitsSection,
    pub removal: RemovalSection,
    pub binaries: BinariesSection,
    pub masks: MasksSection,
    pub destinations: DestinationsSection,
    pub slots: SlotsSection,
    pub interest: InterestSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionSection {
    /// Whole-graph restarts allowed before giving up
    pub restart_cap: u32,
    pub use_existing_for_targets: UseExisting,
    pub use_existing_for_dependencies: UseExisting,
}

impl Default for ResolutionSection {
    fn default() -> Self {
        Self {
            restart_cap: DEFAULT_RESTART_CAP,
            use_existing_for_targets: UseExisting::IfPossible,
            use_existing_for_dependencies: UseExisting::IfPossible,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermitsSection {
    pub downgrade: bool,
    pub mask_override: bool,
    pub removal_of_used: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemovalSection {
    /// Specs whose matches may be removed as a side effect
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinariesSection {
    /// Specs whose changes are always routed through a binary build
    pub via_binary: Vec<String>,
    /// This run produces binaries (excludes existing binaries as origins)
    pub making_binaries: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MasksSection {
    /// Ignore ordinary masks; only strong masks still reject
    pub override_masks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationsSection {
    pub target: DestinationType,
    pub want_target_dependencies: bool,
    pub want_target_runtime_dependencies: bool,
    pub dependencies_on_live: bool,
    pub runtime_dependencies_on_live: bool,
}

impl Default for DestinationsSection {
    fn default() -> Self {
        Self {
            target: DestinationType::Install,
            want_target_dependencies: true,
            want_target_runtime_dependencies: true,
            dependencies_on_live: true,
            runtime_dependencies_on_live: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlotPolicy {
    pub best: bool,
    pub installed: bool,
    pub fallback: bool,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            best: true,
            installed: true,
            fallback: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlotsSection {
    pub for_targets: SlotPolicy,
    pub otherwise: SlotPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterestSection {
    pub take: Vec<String>,
    pub take_groups: Vec<String>,
    pub take_from: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_groups: Vec<String>,
    pub ignore_from: Vec<String>,
    pub no_dependencies_from: Vec<String>,
    pub no_blockers_from: Vec<String>,
    pub follow_installed_dependencies: bool,
    pub follow_installed_build_dependencies: bool,
    /// Absent means "only if already installed"
    pub take_suggestions: Option<bool>,
    pub take_recommendations: Option<bool>,
}

impl Default for InterestSection {
    fn default() -> Self {
        Self {
            take: Vec::new(),
            take_groups: Vec::new(),
            take_from: Vec::new(),
            ignore: Vec::new(),
            ignore_groups: Vec::new(),
            ignore_from: Vec::new(),
            no_dependencies_from: Vec::new(),
            no_blockers_from: Vec::new(),
            follow_installed_dependencies: true,
            follow_installed_build_dependencies: false,
            take_suggestions: None,
            take_recommendations: Some(true),
        }
    }
}

/// Parse a configured spec string, failing the run on bad input
fn parse_config_spec(context: &str, text: &str) -> Result<PackageSpec> {
    PackageSpec::parse(text)
        .map_err(|e| Error::Config(format!("bad spec '{}' in {}: {}", text, context, e)))
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ResolverConfig = toml::from_str(&text)?;
        debug!("Loaded resolver configuration from {}", path.display());
        Ok(config)
    }

    /// Compile the configuration into a helper set
    ///
    /// Every spec string is parsed here; this is the fatal tier of the
    /// failure model.
    pub fn build_helpers(&self) -> Result<Helpers> {
        let mut helpers = Helpers::new();

        for text in &self.removal.allowed {
            helpers
                .allowed_to_remove
                .add_allowed_to_remove_spec(parse_config_spec("removal.allowed", text)?);
        }

        for text in &self.binaries.via_binary {
            helpers
                .always_via_binary
                .add_via_binary_spec(parse_config_spec("binaries.via_binary", text)?);
        }
        helpers
            .origin_filtered_generator
            .set_making_binaries(self.binaries.making_binaries);

        helpers
            .unmaskable_filter
            .set_override_masks(self.masks.override_masks);

        for text in &self.interest.take {
            helpers
                .interest_in_spec
                .add_take_spec(parse_config_spec("interest.take", text)?);
        }
        for group in &self.interest.take_groups {
            helpers.interest_in_spec.add_take_group(group);
        }
        for text in &self.interest.take_from {
            helpers
                .interest_in_spec
                .add_take_from_spec(parse_config_spec("interest.take_from", text)?);
        }
        for text in &self.interest.ignore {
            helpers
                .interest_in_spec
                .add_ignore_spec(parse_config_spec("interest.ignore", text)?);
        }
        for group in &self.interest.ignore_groups {
            helpers.interest_in_spec.add_ignore_group(group);
        }
        for text in &self.interest.ignore_from {
            helpers
                .interest_in_spec
                .add_ignore_from_spec(parse_config_spec("interest.ignore_from", text)?);
        }
        for text in &self.interest.no_dependencies_from {
            helpers.interest_in_spec.add_no_dependencies_from_spec(parse_config_spec(
                "interest.no_dependencies_from",
                text,
            )?);
        }
        for text in &self.interest.no_blockers_from {
            helpers
                .interest_in_spec
                .add_no_blockers_from_spec(parse_config_spec("interest.no_blockers_from", text)?);
        }
        helpers
            .interest_in_spec
            .set_follow_installed_dependencies(self.interest.follow_installed_dependencies);
        helpers
            .interest_in_spec
            .set_follow_installed_build_dependencies(
                self.interest.follow_installed_build_dependencies,
            );
        helpers
            .interest_in_spec
            .set_take_suggestions(self.interest.take_suggestions);
        helpers
            .interest_in_spec
            .set_take_recommendations(self.interest.take_recommendations);

        helpers
            .resolvents_for
            .set_target_destination_type(self.destinations.target);
        helpers
            .resolvents_for
            .set_want_target_dependencies(self.destinations.want_target_dependencies);
        helpers
            .resolvents_for
            .set_want_target_runtime_dependencies(
                self.destinations.want_target_runtime_dependencies,
            );
        helpers
            .resolvents_for
            .set_want_dependencies_on_live(self.destinations.dependencies_on_live);
        helpers
            .resolvents_for
            .set_want_runtime_dependencies_on_live(self.destinations.runtime_dependencies_on_live);
        helpers.resolvents_for.set_target_slots(
            self.slots.for_targets.best,
            self.slots.for_targets.installed,
            self.slots.for_targets.fallback,
        );
        helpers.resolvents_for.set_slots(
            self.slots.otherwise.best,
            self.slots.otherwise.installed,
            self.slots.otherwise.fallback,
        );

        Ok(helpers)
    }

    /// The permissions the decider runs with
    pub fn permissions(&self) -> Permissions {
        Permissions {
            permit_downgrade: self.permits.downgrade,
            permit_mask_override: self.permits.mask_override,
            permit_removal_of_used: self.permits.removal_of_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.resolution.restart_cap, DEFAULT_RESTART_CAP);
        assert!(config.interest.follow_installed_dependencies);
        assert!(!config.interest.follow_installed_build_dependencies);
        assert_eq!(config.interest.take_recommendations, Some(true));
        assert_eq!(config.interest.take_suggestions, None);
        config.build_helpers().unwrap();
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [resolution]
            restart_cap = 8
            use_existing_for_targets = "never"

            [permits]
            downgrade = true

            [removal]
            allowed = ["app/old"]

            [masks]
            override_masks = true

            [slots]
            for_targets = { best = true, installed = false, fallback = true }

            [interest]
            take = ["app/extra"]
            take_suggestions = true
        "#;
        let config: ResolverConfig = toml::from_str(text).unwrap();
        assert_eq!(config.resolution.restart_cap, 8);
        assert_eq!(
            config.resolution.use_existing_for_targets,
            UseExisting::Never
        );
        assert!(config.permits.downgrade);
        assert!(config.masks.override_masks);
        assert!(!config.slots.for_targets.installed);
        assert!(config.slots.for_targets.fallback);
        assert_eq!(config.interest.take_suggestions, Some(true));
        config.build_helpers().unwrap();
    }

    #[test]
    fn test_bad_spec_is_fatal() {
        let mut config = ResolverConfig::default();
        config.removal.allowed.push("not a spec".to_string());
        let err = config.build_helpers().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = "[resolution]\nrestart_caps = 8\n";
        assert!(toml::from_str::<ResolverConfig>(text).is_err());
    }
}
