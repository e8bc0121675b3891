// src/resolver/mod.rs

//! Dependency resolution
//!
//! The resolver turns target specs into a consistent set of
//! per-resolvent decisions (install, upgrade, reinstall, remove, or
//! keep) and a minimised, dependency-ordered job plan. The graph is
//! discovered as dependencies are walked; conflicts recover through a
//! whole-graph restart seeded with a learned preset constraint rather
//! than per-node backtracking.

pub mod constraint;
pub mod decider;
pub mod decision;
pub mod engine;
pub mod helpers;
pub mod job;
pub mod order;
pub mod reason;
pub mod resolution;
pub mod resolved;
pub mod resolvent;
pub mod restart;

pub use constraint::{Constraint, UseExisting};
pub use decider::{Decider, PassOutcome, Permissions};
pub use decision::{Confirmation, Decision, UnsuitableCandidate};
pub use engine::{DEFAULT_RESTART_CAP, Resolver};
pub use helpers::{
    AllowedToRemoveHelper, AlwaysViaBinaryHelper, GetConstraintsForViaBinaryHelper,
    GetInitialConstraintsForHelper, GetResolventsForHelper, Helpers, InterestInSpecHelper,
    MakeOriginFilteredGeneratorHelper, MakeUnmaskableFilterHelper, SpecInterest,
};
pub use job::{
    ExecuteJob, JobList, JobLists, JobNumber, JobRequirement, PretendJob, RequiredIf,
    RequiredIfSet, WorkList, WorkListIndex, minimise_requirements,
};
pub use order::PackageIdComparatorWithPromotion;
pub use reason::Reason;
pub use resolution::Resolution;
pub use resolved::Resolved;
pub use resolvent::{DestinationType, Resolvent, SlotNameOrNull};
pub use restart::SuggestRestart;
