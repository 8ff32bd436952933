//! Physiological State Engine
//!
//! An [`Astronaut`] owns one [`PhysiologicalState`] and exposes one operation
//! per task class. Profiles are shared read-only through `Arc`, so a crew is
//! simply several independent astronauts with no shared mutable state.

use std::sync::Arc;

use crate::dynamics::{Dynamics, TableDynamics};
use crate::error::EvaError;
use crate::profile::{PhysiologyProfile, TaskClass};
use crate::state::{Anthropometrics, PhysiologicalState, Variable};

/// One simulated crew member.
#[derive(Debug, Clone)]
pub struct Astronaut {
    state: PhysiologicalState,
    dynamics: TableDynamics,
}

impl Astronaut {
    /// Create an astronaut at baseline with default anthropometrics.
    pub fn new(profile: Arc<PhysiologyProfile>) -> Self {
        Self::with_anthropometrics(profile, Anthropometrics::default())
    }

    pub fn with_anthropometrics(profile: Arc<PhysiologyProfile>, body: Anthropometrics) -> Self {
        let state = PhysiologicalState::from_baseline(|v| profile.baseline(v), body);
        Self {
            state,
            dynamics: TableDynamics::new(profile),
        }
    }

    pub fn state(&self) -> &PhysiologicalState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> PhysiologicalState {
        self.state.clone()
    }

    /// Seed one variable for a scenario. The value goes through the same
    /// sanitize-and-clamp path as every task update; the clock is untouched.
    pub fn seed(&mut self, var: Variable, value: f64) {
        self.dynamics.commit(&mut self.state, var, value);
    }

    pub fn profile(&self) -> &Arc<PhysiologyProfile> {
        self.dynamics.profile()
    }

    /// Rest in the suit; recovers toward baseline.
    pub fn rest(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Rest, minutes)
    }

    /// Light work: monitoring, small adjustments. Sustainable for 30+ minutes.
    pub fn work_low(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Low, minutes)
    }

    /// Moderate work: hand-rail translation, routine tool use. About 15 minutes sustainable.
    pub fn work_normal(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Normal, minutes)
    }

    /// Heavy exertion: hauling hardware. About 5 minutes sustainable.
    pub fn work_hard(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Hard, minutes)
    }

    /// Low physical, high mental load.
    pub fn task_cognitive(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Cognitive, minutes)
    }

    /// Seal breach, hardware failure: moderate physical, heavy stress.
    pub fn emergency_response(&mut self, minutes: i64) -> Result<(), EvaError> {
        self.perform(TaskClass::Emergency, minutes)
    }

    /// Run `minutes` single-minute ticks of `task`.
    ///
    /// Fails before touching the state when `minutes` is not positive.
    pub fn perform(&mut self, task: TaskClass, minutes: i64) -> Result<(), EvaError> {
        if minutes <= 0 {
            return Err(EvaError::InvalidArgument { minutes });
        }
        for _ in 0..minutes {
            self.dynamics.tick(&mut self.state, task);
        }
        tracing::debug!(
            task = %task,
            minutes,
            met = self.state.mission_elapsed_time,
            heart_rate = self.state.heart_rate,
            "task applied"
        );
        Ok(())
    }

    /// Apply an instantaneous shock event. Takes exactly one minute.
    pub fn apply_shock_event(&mut self, id: &str) -> Result<(), EvaError> {
        let profile = Arc::clone(self.dynamics.profile());
        let shock = profile
            .shock(id)
            .ok_or_else(|| EvaError::UnknownTask(id.to_string()))?;

        self.state.mission_elapsed_time += 1;
        for (&var, &delta) in &shock.add {
            let proposed = self.state.get(var) + delta;
            self.dynamics.commit(&mut self.state, var, proposed);
        }
        for (&var, &value) in &shock.set {
            self.dynamics.commit(&mut self.state, var, value);
        }

        tracing::warn!(
            shock = id,
            met = self.state.mission_elapsed_time,
            fear = self.state.fear,
            "shock event applied"
        );
        Ok(())
    }

    /// Restore every dynamic variable to baseline. Clock and body are kept.
    pub fn reset(&mut self) {
        let profile = self.dynamics.profile();
        for var in Variable::ALL {
            self.state.set(var, profile.baseline(var));
        }
    }
}
