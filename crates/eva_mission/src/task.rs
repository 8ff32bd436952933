//! Task vocabulary and sequence parsing.
//!
//! A mission plan is a string of task letters: `R L N H C E` for the six
//! task classes plus one letter per shock event in the active profile.
//! Whitespace and commas separate nothing and are skipped. Any other
//! character is an [`EvaError::UnknownTask`]; the whole sequence is rejected
//! before a single minute is simulated, so the logged task axis can never
//! drift away from mission time.

use eva_core::{EvaError, PhysiologyProfile, TaskClass};
use std::fmt;

/// What one sequence element asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Work(TaskClass),
    /// Shock event id in the profile.
    Shock(String),
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Work(class) => write!(f, "{}", class),
            Task::Shock(id) => write!(f, "shock:{}", id),
        }
    }
}

/// One parsed sequence element with the letter it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStep {
    pub letter: char,
    pub task: Task,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSequence {
    steps: Vec<TaskStep>,
}

impl TaskSequence {
    /// Resolve every letter of `text` against the fixed task letters and the
    /// profile's shock letters.
    pub fn parse(text: &str, profile: &PhysiologyProfile) -> Result<Self, EvaError> {
        let steps = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|letter| {
                let task = match TaskClass::from_letter(letter) {
                    Some(class) => Task::Work(class),
                    None => match profile.shock_by_letter(letter) {
                        Some(shock) => Task::Shock(shock.id.clone()),
                        None => return Err(EvaError::UnknownTask(letter.to_string())),
                    },
                };
                Ok(TaskStep { letter, task })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[TaskStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The sequence written back as letters.
    pub fn letters(&self) -> String {
        self.steps.iter().map(|s| s.letter).collect()
    }
}
