//! Request/response messages exchanged between the UI, the background
//! service and content contexts.
//!
//! Requests look like `{"action": "toggleRules"}`. Responses always carry
//! `success`; `status` and `error` are present when they apply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code for a request without an `action` field.
pub const NO_ACTION: &str = "no_action";
/// Error code for an `action` nobody handles.
pub const UNKNOWN_ACTION: &str = "unknown_action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ControlAction {
    /// Report the current activation state
    #[cfg_attr(feature = "clap", value(name = "status"))]
    GetStatus,
    /// Flip the activation state
    #[cfg_attr(feature = "clap", value(name = "toggle"))]
    ToggleRules,
    /// Turn ad blocking on
    Enable,
    /// Turn ad blocking off
    Disable,
}

impl ControlAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetStatus => "getStatus",
            Self::ToggleRules => "toggleRules",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// Build the wire request for this action.
    pub fn to_request(self) -> Value {
        serde_json::json!({ "action": self.as_str() })
    }

    /// Decode a request, mapping a missing or unknown action to its error
    /// code.
    pub fn decode(request: &Value) -> Result<Self, &'static str> {
        match request.get("action") {
            None | Some(Value::Null) => Err(NO_ACTION),
            Some(Value::String(action)) if action.is_empty() => Err(NO_ACTION),
            Some(action) => serde_json::from_value(action.clone()).map_err(|_| UNKNOWN_ACTION),
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlResponse {
    pub fn ok(status: Status) -> Self {
        Self {
            success: true,
            status: Some(status),
            error: None,
        }
    }

    /// A failed state change; `status` is the state that is still in force.
    pub fn failed(status: Status, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: Some(status),
            error: Some(error.into()),
        }
    }

    pub fn rejected(code: &str) -> Self {
        Self {
            success: false,
            status: None,
            error: Some(code.to_owned()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
