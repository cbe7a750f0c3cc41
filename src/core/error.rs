//! Error types shared by the cooldown store and detector configuration.

/// Errors raised while configuring the detector or evaluating cooldowns.
#[derive(Debug, thiserror::Error)]
pub enum ExitIntentError {
    /// A cooldown pattern is neither the wildcard nor a valid regular expression
    #[error("Invalid cooldown pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A duration option is negative, NaN or infinite
    #[error("Invalid {field}: {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    /// The mouse-move edge tolerance is negative, NaN or infinite
    #[error("Invalid edgeTolerance: {0}")]
    InvalidEdgeTolerance(f64),

    /// A partial options object could not be deserialized
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExitIntentError>;

/// Reject durations the scheduler and cooldown arithmetic cannot use.
pub(crate) fn check_duration(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ExitIntentError::InvalidDuration { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_duration_accepts_zero_and_positive() {
        assert_eq!(check_duration("cooldownMinutes", 0.0).unwrap(), 0.0);
        assert_eq!(check_duration("cooldownMinutes", 2.5).unwrap(), 2.5);
    }

    #[test]
    fn test_check_duration_rejects_bad_values() {
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let err = check_duration("bindDelayMs", value).unwrap_err();
            assert!(matches!(
                err,
                ExitIntentError::InvalidDuration {
                    field: "bindDelayMs",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_error_display() {
        let err = ExitIntentError::InvalidDuration {
            field: "cooldownMinutes",
            value: -3.0,
        };
        assert_eq!(err.to_string(), "Invalid cooldownMinutes: -3");
        assert_eq!(
            ExitIntentError::InvalidEdgeTolerance(-1.0).to_string(),
            "Invalid edgeTolerance: -1"
        );
    }
}
