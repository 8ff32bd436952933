use thiserror::Error;

/// Conditions the engine and its drivers can fail with.
///
/// Hitting a physiological limit or a task target is never an error; those are
/// ordinary outcomes visible in the resulting state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaError {
    /// A multi-minute operation was asked to run for zero or negative minutes.
    #[error("invalid argument: minutes must be positive, got {minutes}")]
    InvalidArgument { minutes: i64 },

    /// A task token (sequence letter or shock identifier) has no mapped operation.
    #[error("unknown task: '{0}'")]
    UnknownTask(String),

    /// A profile table is absent or malformed.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),
}

impl EvaError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingConfiguration(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let e = EvaError::InvalidArgument { minutes: -3 };
        assert!(e.to_string().contains("-3"));

        let e = EvaError::UnknownTask("X".to_string());
        assert_eq!(e.to_string(), "unknown task: 'X'");

        let e = EvaError::missing("task table 'hard'");
        assert!(e.to_string().contains("hard"));
    }
}
