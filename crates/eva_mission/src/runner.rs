//! Sequence runner: one engine call per task letter, one log record per call.

use eva_core::{homeostatic_error, saturated, Astronaut, EvaError, PhysiologicalState, Variable};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::log::{EvaLog, LogRecord};
use crate::task::{Task, TaskSequence};

/// Drives an [`Astronaut`] through a [`TaskSequence`].
#[derive(Debug, Clone, Copy)]
pub struct MissionRunner {
    granularity_minutes: i64,
}

impl MissionRunner {
    /// `granularity_minutes` is the duration of every work letter.
    pub fn new(granularity_minutes: i64) -> Result<Self, EvaError> {
        if granularity_minutes <= 0 {
            return Err(EvaError::InvalidArgument {
                minutes: granularity_minutes,
            });
        }
        Ok(Self { granularity_minutes })
    }

    pub fn granularity_minutes(&self) -> i64 {
        self.granularity_minutes
    }

    /// Run every step in order. Records are labeled with cumulative mission
    /// minutes.
    pub fn run(&self, astronaut: &mut Astronaut, sequence: &TaskSequence) -> Result<EvaLog, EvaError> {
        let _span = tracing::info_span!("mission", steps = sequence.len()).entered();
        let profile = std::sync::Arc::clone(astronaut.profile());
        let mut log = EvaLog::new(&profile, astronaut.state());
        let mut pinned: BTreeSet<Variable> = saturated(astronaut.state(), &profile).into_iter().collect();

        for step in sequence.steps() {
            match &step.task {
                Task::Work(class) => astronaut.perform(*class, self.granularity_minutes)?,
                Task::Shock(id) => astronaut.apply_shock_event(id)?,
            }

            let state = astronaut.state();
            let now: BTreeSet<Variable> = saturated(state, &profile).into_iter().collect();
            for var in now.difference(&pinned) {
                tracing::warn!(
                    variable = %var,
                    value = state.get(*var),
                    met = state.mission_elapsed_time,
                    "variable reached its physiological limit"
                );
            }
            pinned = now;

            log.push(LogRecord::from_state(
                state.mission_elapsed_time.to_string(),
                step.letter.to_string(),
                state,
            ));
        }

        tracing::info!(
            minutes = astronaut.state().mission_elapsed_time,
            homeostatic_error = homeostatic_error(astronaut.state(), &profile),
            "mission complete"
        );
        Ok(log)
    }
}

/// End-of-mission summary for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub name: String,
    pub sequence: String,
    pub final_state: PhysiologicalState,
    pub homeostatic_error: f64,
    pub saturated: Vec<Variable>,
}

impl MissionReport {
    pub fn new(name: impl Into<String>, sequence: &TaskSequence, astronaut: &Astronaut) -> Self {
        let profile = astronaut.profile();
        Self {
            name: name.into(),
            sequence: sequence.letters(),
            final_state: astronaut.state().clone(),
            homeostatic_error: homeostatic_error(astronaut.state(), profile),
            saturated: saturated(astronaut.state(), profile),
        }
    }
}
