//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Execution mode '{mode}' cannot be combined with rejection policy '{policy}'")]
    IncompatibleSettings { mode: String, policy: String },

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    #[error("Unknown execution setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid supervision decision: {0}")]
    InvalidDecision(String),
}

impl DomainError {
    /// Check if this error comes from the settings surface
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::IncompatibleSettings { .. }
                | DomainError::InvalidValue { .. }
                | DomainError::UnknownSetting(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_settings_display() {
        let error = DomainError::IncompatibleSettings {
            mode: "monitoring".to_string(),
            policy: "resample_with_feedback".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Execution mode 'monitoring' cannot be combined with rejection policy 'resample_with_feedback'"
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(DomainError::UnknownSetting("x".to_string()).is_configuration());
        assert!(
            DomainError::InvalidValue {
                field: "n_resamples".to_string(),
                value: "-1".to_string(),
            }
            .is_configuration()
        );
        assert!(!DomainError::InvalidDecision("modify without call".to_string()).is_configuration());
    }
}
