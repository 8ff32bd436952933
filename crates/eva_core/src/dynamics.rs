//! State Dynamics: the per-minute update rule
//!
//! Every multi-minute task is a sequence of identical single-minute ticks.
//! One tick:
//! 1. advances the mission clock by one minute
//! 2. moves each target-seeking variable toward its task target by at most
//!    its rate, never past the target, then clamps into the global limits
//! 3. adds the flat drift of each accumulator, then clamps into the limits
//!
//! Limits take precedence over targets: a target outside the limits pins the
//! variable at the limit.

use crate::profile::{PhysiologyProfile, SeekRule, TaskClass};
use crate::state::{sanitize_f64, PhysiologicalState, Variable};
use std::sync::Arc;

/// Trait for implementing state dynamics
pub trait Dynamics: Send + Sync {
    /// Advance the state by exactly one simulated minute of `task`.
    fn tick(&self, state: &mut PhysiologicalState, task: TaskClass);
}

/// Move `current` toward `rule.target` by at most `rule.rate`, stopping on the target.
#[inline]
pub fn seek_toward(current: f64, rule: SeekRule) -> f64 {
    if rule.target > current {
        (current + rule.rate).min(rule.target)
    } else if rule.target < current {
        (current - rule.rate).max(rule.target)
    } else {
        current
    }
}

/// Table-driven dynamics backed by a [`PhysiologyProfile`].
#[derive(Debug, Clone)]
pub struct TableDynamics {
    profile: Arc<PhysiologyProfile>,
}

impl TableDynamics {
    pub fn new(profile: Arc<PhysiologyProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &Arc<PhysiologyProfile> {
        &self.profile
    }

    /// Clamp into the limits and commit, falling back to baseline on NaN/Inf.
    pub fn commit(&self, state: &mut PhysiologicalState, var: Variable, proposed: f64) {
        let proposed = sanitize_f64(proposed, self.profile.baseline(var));
        state.set(var, self.profile.limits(var).clamp(proposed));
    }
}

impl Default for TableDynamics {
    fn default() -> Self {
        Self::new(Arc::new(PhysiologyProfile::default()))
    }
}

impl Dynamics for TableDynamics {
    fn tick(&self, state: &mut PhysiologicalState, task: TaskClass) {
        state.mission_elapsed_time += 1;

        let table = self.profile.task(task);

        for (&var, &rule) in &table.seek {
            let proposed = seek_toward(state.get(var), rule);
            self.commit(state, var, proposed);
        }

        // Accumulators have no target, so no overshoot protection.
        for (&var, &delta) in &table.drift {
            let proposed = state.get(var) + delta;
            self.commit(state, var, proposed);
        }
    }
}

/// Compute homeostatic error: mean deviation from baseline, each variable
/// normalized by its limit span. Unbounded variables are skipped.
pub fn homeostatic_error(state: &PhysiologicalState, profile: &PhysiologyProfile) -> f64 {
    let mut total = 0.0;
    let mut n = 0usize;
    for (var, value) in state.values() {
        let limits = profile.limits(var);
        let span = limits.max - limits.min;
        if !limits.is_bounded() || span <= 0.0 {
            continue;
        }
        total += (value - profile.baseline(var)).abs() / span;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}

/// Variables currently pinned at either of their limits.
pub fn saturated(state: &PhysiologicalState, profile: &PhysiologyProfile) -> Vec<Variable> {
    state
        .values()
        .filter(|(var, value)| {
            let limits = profile.limits(*var);
            *value == limits.min || *value == limits.max
        })
        .map(|(var, _)| var)
        .collect()
}
