//! # EVA physiology core
//!
//! Minute-by-minute model of one astronaut's physiological state during
//! extravehicular activity. Each task class pushes a set of variables toward
//! task-specific targets at task-specific rates, bounded by global limits.
//!
//! - [`profile`]: limits, baselines, task tables and shock events (data)
//! - [`dynamics`]: the per-minute update rule (algorithm)
//! - [`astronaut`]: the engine surface, one operation per task class

pub mod astronaut;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod profile;
pub mod state;

pub use astronaut::Astronaut;
pub use config::{EvaConfig, MissionConfig, SimulationConfig};
pub use dynamics::{homeostatic_error, saturated, seek_toward, Dynamics, TableDynamics};
pub use error::EvaError;
pub use profile::{Limits, PhysiologyProfile, SeekRule, ShockEvent, TaskClass, TaskTable, UpdateMode};
pub use state::{Anthropometrics, PhysiologicalState, Variable};
