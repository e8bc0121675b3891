// src/resolver/resolution.rs

//! Resolutions: the per-resolvent record of constraints and decision

use super::constraint::Constraint;
use super::decision::Decision;
use super::resolvent::Resolvent;
use serde::{Deserialize, Serialize};

/// Accumulated constraints and the eventual decision for one resolvent
///
/// Exactly one resolution exists per resolvent in the live map.
/// Constraints accumulate monotonically within a pass; the decision is
/// set once per pass and only replaced on a whole-graph restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolvent: Resolvent,
    pub constraints: Vec<Constraint>,
    pub decision: Option<Decision>,
}

impl Resolution {
    pub fn new(resolvent: Resolvent) -> Self {
        Self {
            resolvent,
            constraints: Vec::new(),
            decision: None,
        }
    }

    /// Append a constraint; constraints are never removed within a pass
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// A resolution is taken when any of its constraints is taken
    pub fn is_taken(&self) -> bool {
        self.constraints.iter().any(|c| !c.untaken)
    }

    /// True when every constraint tolerates an empty result
    pub fn nothing_is_fine(&self) -> bool {
        !self.constraints.is_empty() && self.constraints.iter().all(|c| c.nothing_is_fine_too)
    }
}
