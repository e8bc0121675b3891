// src/resolver/restart.rs

//! The restart suggestion: single-shot conflict recovery
//!
//! When a newly-added constraint contradicts a decision that was
//! already made, the decider does not backtrack the one node. It
//! returns a restart suggestion carrying a preset constraint that, fed
//! into the next pass's initial constraints, makes the right decision
//! first time. The driver discards the entire resolution map and
//! re-runs; aborted-pass state is never reused.

use super::constraint::Constraint;
use super::decision::Decision;
use super::resolvent::Resolvent;
use std::fmt;

/// Everything the driver needs to restart usefully
#[derive(Debug, Clone)]
pub struct SuggestRestart {
    /// The resolvent whose decision went wrong
    pub resolvent: Resolvent,
    /// The decision that turned out to be wrong
    pub previous_decision: Decision,
    /// The constraint that could not be reconciled with it
    pub problematic_constraint: Constraint,
    /// The decision the next pass should reach
    pub new_decision: Decision,
    /// Preset constraint to seed the next pass with
    pub suggested_preset: Constraint,
}

impl fmt::Display for SuggestRestart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restart for {}: had decided '{}', but constraint {} needs '{}'",
            self.resolvent, self.previous_decision, self.problematic_constraint, self.new_decision
        )
    }
}
