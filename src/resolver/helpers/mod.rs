// src/resolver/helpers/mod.rs

//! Policy helpers consulted by the resolution driver
//!
//! Each helper is a small, independently configured decision function.
//! They are assembled from run configuration before resolution starts
//! and queried read-only during the run; nothing here is shared across
//! runs.

mod allowed_to_remove;
mod always_via_binary;
mod initial_constraints;
mod interest;
mod origin_filter;
mod resolvents_for;
mod unmask_filter;
mod via_binary;

pub use allowed_to_remove::AllowedToRemoveHelper;
pub use always_via_binary::AlwaysViaBinaryHelper;
pub use initial_constraints::GetInitialConstraintsForHelper;
pub use interest::{InterestInSpecHelper, SpecInterest};
pub use origin_filter::MakeOriginFilteredGeneratorHelper;
pub use resolvents_for::GetResolventsForHelper;
pub use unmask_filter::MakeUnmaskableFilterHelper;
pub use via_binary::GetConstraintsForViaBinaryHelper;

/// The full helper set for one resolution run
#[derive(Debug)]
pub struct Helpers {
    pub allowed_to_remove: AllowedToRemoveHelper,
    pub always_via_binary: AlwaysViaBinaryHelper,
    pub constraints_for_via_binary: GetConstraintsForViaBinaryHelper,
    pub origin_filtered_generator: MakeOriginFilteredGeneratorHelper,
    pub unmaskable_filter: MakeUnmaskableFilterHelper,
    pub interest_in_spec: InterestInSpecHelper,
    pub resolvents_for: GetResolventsForHelper,
    pub initial_constraints: GetInitialConstraintsForHelper,
}

impl Helpers {
    pub fn new() -> Self {
        Self {
            allowed_to_remove: AllowedToRemoveHelper::new(),
            always_via_binary: AlwaysViaBinaryHelper::new(),
            constraints_for_via_binary: GetConstraintsForViaBinaryHelper::new(),
            origin_filtered_generator: MakeOriginFilteredGeneratorHelper::new(),
            unmaskable_filter: MakeUnmaskableFilterHelper::new(),
            interest_in_spec: InterestInSpecHelper::new(),
            resolvents_for: GetResolventsForHelper::new(),
            initial_constraints: GetInitialConstraintsForHelper::new(),
        }
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::new()
    }
}
