// src/resolver/helpers/always_via_binary.rs

//! Should a change be routed through a binary build?

use crate::resolver::decision::Decision;
use crate::resolver::resolution::Resolution;
use crate::spec::PackageSpec;

/// Decides whether a change decision must be made via a binary package
///
/// Only changes whose origin can actually produce a binary and that
/// match the configured spec list are routed through a binary build.
#[derive(Debug)]
pub struct AlwaysViaBinaryHelper {
    via_binary_specs: Vec<PackageSpec>,
}

impl AlwaysViaBinaryHelper {
    pub fn new() -> Self {
        Self {
            via_binary_specs: Vec::new(),
        }
    }

    /// Route anything matching the spec through a binary build
    pub fn add_via_binary_spec(&mut self, spec: PackageSpec) {
        self.via_binary_specs.push(spec);
    }

    /// Must this resolution's change go via a binary?
    pub fn always_via_binary(&self, resolution: &Resolution) -> bool {
        let Some(Decision::ChangesToMake { origin_id, .. }) = &resolution.decision else {
            return false;
        };

        origin_id.binary_buildable
            && self
                .via_binary_specs
                .iter()
                .any(|spec| spec.matches(origin_id))
    }
}

impl Default for AlwaysViaBinaryHelper {
    fn default() -> Self {
        Self::new()
    }
}
