//! # EVA mission driver
//!
//! Turns a mission plan into a logged physiological time series:
//! 1. parse task letters into a [`TaskSequence`] (unknown letters stop here)
//! 2. run them against an [`eva_core::Astronaut`] with [`MissionRunner`]
//! 3. write the resulting [`EvaLog`] as a delimited file

pub mod log;
pub mod mission;
mod runner;
mod task;

pub use log::{round_to, EvaLog, LogOptions, LogRecord};
pub use runner::{MissionReport, MissionRunner};
pub use task::{Task, TaskSequence, TaskStep};
