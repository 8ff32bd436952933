//! eva_bench: trajectory tests for the EVA physiology engine.
//!
//! Validates behavior over whole work periods rather than single minutes:
//! - sustainability windows of each workload
//! - recovery during rest
//! - shock response followed by recovery
//! - radiation accumulating across a full EVA

use eva_core::{Astronaut, EvaError, PhysiologicalState, PhysiologyProfile, TaskClass, Variable};
use std::sync::Arc;

/// Run `class` one minute at a time for `minutes`, recording the state after
/// every minute. Non-positive `minutes` is an error.
pub fn trajectory(
    astronaut: &mut Astronaut,
    class: TaskClass,
    minutes: i64,
) -> Result<Vec<PhysiologicalState>, EvaError> {
    if minutes <= 0 {
        return Err(EvaError::InvalidArgument { minutes });
    }
    let mut states = Vec::new();
    for _ in 0..minutes {
        astronaut.perform(class, 1)?;
        states.push(astronaut.snapshot());
    }
    Ok(states)
}

/// First minute (1-based) at which `var` reaches `threshold` from below.
pub fn minutes_until(states: &[PhysiologicalState], var: Variable, threshold: f64) -> Option<usize> {
    states.iter().position(|s| s.get(var) >= threshold).map(|i| i + 1)
}

pub fn fresh_astronaut() -> Astronaut {
    Astronaut::new(Arc::new(PhysiologyProfile::default()))
}
