use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, EnumString};

use super::lenient;

/// Known kinds of verification actions. The service may add new ones, so
/// [`AuthAction`] keeps the raw string and exposes this as a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ActionType {
    Captcha,
    Manual,
    Verify,
    Ban,
}

impl ActionType {
    pub fn label(self) -> &'static str {
        match self {
            ActionType::Captcha => "Troll Captcha (manual verify required)",
            ActionType::Manual => "No troll captcha (manual verify still required)",
            ActionType::Verify => "User Verified",
            ActionType::Ban => "User Banned",
        }
    }
}

/// One entry of the verification queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAction {
    #[serde(deserialize_with = "lenient::required_id")]
    pub action_id: String,
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub user_id: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub resolved: bool,
}

impl AuthAction {
    pub fn kind(&self) -> Option<ActionType> {
        self.action_type.parse().ok()
    }

    /// Human readable label; unknown kinds show their raw name.
    pub fn label(&self) -> &str {
        match self.kind() {
            Some(kind) => kind.label(),
            None => &self.action_type,
        }
    }

    pub fn status(&self) -> ActionStatus {
        if self.resolved {
            ActionStatus::Resolved
        } else {
            ActionStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ActionStatus {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub action_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
