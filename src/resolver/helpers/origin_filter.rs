// src/resolver/helpers/origin_filter.rs

//! Origin filtering for candidate generators

use crate::env::{Filter, FilteredGenerator};

/// Composes an extra origin filter onto candidate generators
///
/// When the run is producing binaries, candidates that already are
/// binaries must be excluded (a binary is not rebuilt from a binary);
/// otherwise generators pass through unchanged.
#[derive(Debug)]
pub struct MakeOriginFilteredGeneratorHelper {
    making_binaries: bool,
}

impl MakeOriginFilteredGeneratorHelper {
    pub fn new() -> Self {
        Self {
            making_binaries: false,
        }
    }

    pub fn set_making_binaries(&mut self, b: bool) {
        self.making_binaries = b;
    }

    /// Apply the configured origin policy to a generator
    pub fn make_generator(&self, generator: FilteredGenerator) -> FilteredGenerator {
        if self.making_binaries {
            generator.filtered(Filter::NotBinary)
        } else {
            generator
        }
    }
}

impl Default for MakeOriginFilteredGeneratorHelper {
    fn default() -> Self {
        Self::new()
    }
}
