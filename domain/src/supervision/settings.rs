//! Execution settings for a supervised run.
//!
//! [`ExecutionSettings`] is built and validated once at bootstrap and never
//! changes for the rest of the run.
//!
//! | Key                            | Type                        | Default                  |
//! |--------------------------------|-----------------------------|--------------------------|
//! | `execution_mode`               | [`ExecutionMode`]           | `supervision`            |
//! | `allow_tool_modifications`     | bool                        | `false`                  |
//! | `rejection_policy`             | [`RejectionPolicy`]         | `resample_with_feedback` |
//! | `n_resamples`                  | unsigned integer            | `3`                      |
//! | `multi_supervisor_resolution`  | [`MultiSupervisorResolution`] | `all_must_approve`     |
//! | `remove_feedback_from_context` | bool                        | `false`                  |

use super::decision::DecisionKind;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// How supervision is scheduled relative to the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Blocking: the tool call waits for every chain to finish.
    #[default]
    Supervision,
    /// Fire-and-forget: decisions are recorded for audit only.
    Monitoring,
}

impl ExecutionMode {
    pub fn is_monitoring(&self) -> bool {
        matches!(self, ExecutionMode::Monitoring)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Supervision => write!(f, "supervision"),
            ExecutionMode::Monitoring => write!(f, "monitoring"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supervision" => Ok(ExecutionMode::Supervision),
            "monitoring" => Ok(ExecutionMode::Monitoring),
            _ => Err(invalid("execution_mode", s)),
        }
    }
}

/// What happens when the chains reject a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Replace the call with an explanatory assistant message right away.
    NoResample,
    /// Feed the supervisors' feedback to the model and ask it to retry.
    #[default]
    ResampleWithFeedback,
}

impl fmt::Display for RejectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionPolicy::NoResample => write!(f, "no_resample"),
            RejectionPolicy::ResampleWithFeedback => write!(f, "resample_with_feedback"),
        }
    }
}

impl std::str::FromStr for RejectionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no_resample" => Ok(RejectionPolicy::NoResample),
            "resample_with_feedback" => Ok(RejectionPolicy::ResampleWithFeedback),
            _ => Err(invalid("rejection_policy", s)),
        }
    }
}

/// How the final decisions of several chains combine into one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiSupervisorResolution {
    /// Every chain must end in APPROVE.
    #[default]
    AllMustApprove,
}

impl MultiSupervisorResolution {
    /// Whether the remaining chains can be skipped once a chain ended on `last`.
    ///
    /// A MODIFY always stops: the modified call has to be re-validated from
    /// the first chain before any other chain sees it.
    pub fn stops_after(&self, last: DecisionKind) -> bool {
        if last == DecisionKind::Modify {
            return true;
        }
        match self {
            MultiSupervisorResolution::AllMustApprove => matches!(
                last,
                DecisionKind::Escalate | DecisionKind::Reject | DecisionKind::Terminate
            ),
        }
    }
}

impl fmt::Display for MultiSupervisorResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiSupervisorResolution::AllMustApprove => write!(f, "all_must_approve"),
        }
    }
}

impl std::str::FromStr for MultiSupervisorResolution {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all_must_approve" => Ok(MultiSupervisorResolution::AllMustApprove),
            _ => Err(invalid("multi_supervisor_resolution", s)),
        }
    }
}

fn invalid(field: &str, value: impl ToString) -> DomainError {
    DomainError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Immutable per-run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub execution_mode: ExecutionMode,
    pub allow_tool_modifications: bool,
    pub rejection_policy: RejectionPolicy,
    pub n_resamples: u32,
    pub multi_supervisor_resolution: MultiSupervisorResolution,
    pub remove_feedback_from_context: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Supervision,
            allow_tool_modifications: false,
            rejection_policy: RejectionPolicy::ResampleWithFeedback,
            n_resamples: 3,
            multi_supervisor_resolution: MultiSupervisorResolution::AllMustApprove,
            remove_feedback_from_context: false,
        }
    }
}

impl ExecutionSettings {
    /// Settings for fire-and-forget auditing. Resampling is switched off
    /// since it needs to block on the outcome.
    pub fn monitoring() -> Self {
        Self {
            execution_mode: ExecutionMode::Monitoring,
            rejection_policy: RejectionPolicy::NoResample,
            ..Self::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_tool_modifications(mut self, allow: bool) -> Self {
        self.allow_tool_modifications = allow;
        self
    }

    pub fn with_rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    pub fn with_n_resamples(mut self, n: u32) -> Self {
        self.n_resamples = n;
        self
    }

    pub fn with_multi_supervisor_resolution(mut self, resolution: MultiSupervisorResolution) -> Self {
        self.multi_supervisor_resolution = resolution;
        self
    }

    pub fn with_remove_feedback_from_context(mut self, remove: bool) -> Self {
        self.remove_feedback_from_context = remove;
        self
    }

    // ==================== Validation ====================

    /// Reject combinations that cannot work.
    ///
    /// Monitoring never blocks the agent loop, so it cannot wait for a
    /// resampled response.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.execution_mode == ExecutionMode::Monitoring
            && self.rejection_policy == RejectionPolicy::ResampleWithFeedback
        {
            return Err(DomainError::IncompatibleSettings {
                mode: self.execution_mode.to_string(),
                policy: self.rejection_policy.to_string(),
            });
        }
        Ok(())
    }

    /// Consume and return the settings if they are valid.
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        Ok(self)
    }

    /// Build settings from the key/value configuration surface.
    ///
    /// Missing keys keep their defaults; unknown keys, wrong value types and
    /// unknown enum values fail. The result is validated.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, DomainError> {
        let mut settings = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "execution_mode" => settings.execution_mode = enum_value(key, value)?,
                "allow_tool_modifications" => {
                    settings.allow_tool_modifications = bool_value(key, value)?
                }
                "rejection_policy" => settings.rejection_policy = enum_value(key, value)?,
                "n_resamples" => {
                    settings.n_resamples = value
                        .as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| invalid(key, value))?
                }
                "multi_supervisor_resolution" => {
                    settings.multi_supervisor_resolution = enum_value(key, value)?
                }
                "remove_feedback_from_context" => {
                    settings.remove_feedback_from_context = bool_value(key, value)?
                }
                other => return Err(DomainError::UnknownSetting(other.to_string())),
            }
        }
        settings.validated()
    }
}

fn enum_value<T>(key: &str, value: &Value) -> Result<T, DomainError>
where
    T: std::str::FromStr<Err = DomainError>,
{
    value.as_str().ok_or_else(|| invalid(key, value))?.parse()
}

fn bool_value(key: &str, value: &Value) -> Result<bool, DomainError> {
    value.as_bool().ok_or_else(|| invalid(key, value))
}
