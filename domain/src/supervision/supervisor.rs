//! Supervisor identity and chains

use crate::core::error::DomainError;
use crate::core::ids::{ChainId, SupervisorId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who (or what) produces a supervisor's decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorKind {
    Human,
    Llm,
    #[default]
    ClientProgrammatic,
    None,
}

impl SupervisorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorKind::Human => "human",
            SupervisorKind::Llm => "llm",
            SupervisorKind::ClientProgrammatic => "client_programmatic",
            SupervisorKind::None => "none",
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, SupervisorKind::Human)
    }
}

impl fmt::Display for SupervisorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SupervisorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "human" => Ok(SupervisorKind::Human),
            "llm" => Ok(SupervisorKind::Llm),
            "client_programmatic" | "programmatic" => Ok(SupervisorKind::ClientProgrammatic),
            "none" => Ok(SupervisorKind::None),
            _ => Err(DomainError::InvalidValue {
                field: "supervisor_kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Registered identity of a supervisor.
///
/// The callable itself lives in the local process; this is the part that
/// is shared with the registry for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorInfo {
    pub id: SupervisorId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: SupervisorKind,
}

impl SupervisorInfo {
    pub fn new(id: impl Into<SupervisorId>, name: impl Into<String>, kind: SupervisorKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered sequence of supervisors sharing one chain id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorChain {
    pub chain_id: ChainId,
    pub supervisors: Vec<SupervisorInfo>,
}

impl SupervisorChain {
    pub fn new(chain_id: impl Into<ChainId>, supervisors: Vec<SupervisorInfo>) -> Self {
        Self {
            chain_id: chain_id.into(),
            supervisors,
        }
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }
}
