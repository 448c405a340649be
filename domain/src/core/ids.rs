//! Identifiers shared between the local process and the supervision registry.
//!
//! Every identity the registry hands out is an opaque string. Each kind gets
//! its own newtype so a tool id can never be passed where a supervisor id is
//! expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Registry identity of a project.
    ProjectId
);
string_id!(
    /// Registry identity of a task within a project.
    TaskId
);
string_id!(
    /// Registry identity of one agent run.
    RunId
);
string_id!(
    /// Registry identity of a supervised tool.
    ToolId
);
string_id!(
    /// Registry identity of a supervisor.
    SupervisorId
);
string_id!(
    /// Identity shared by every supervisor of one chain.
    ChainId
);
string_id!(
    /// Registry-side identity of one logged tool call.
    ///
    /// Distinct from the provider-assigned id carried on
    /// [`ToolCall::id`](crate::tool::entities::ToolCall).
    ToolCallId
);
string_id!(
    /// Identity of one supervision request recorded in the registry.
    SupervisionRequestId
);
