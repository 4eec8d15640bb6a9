use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, EnumString};

use super::lenient;

/// Declared type of a bot configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString)]
pub enum ConfigValueType {
    TextChannel,
    CategoryChannel,
    Role,
    #[serde(rename = "int")]
    #[strum(serialize = "int")]
    Int,
    #[serde(rename = "float")]
    #[strum(serialize = "float")]
    Float,
    #[serde(rename = "bool")]
    #[strum(serialize = "bool")]
    Bool,
    #[serde(rename = "str")]
    #[strum(serialize = "str")]
    Str,
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl ConfigValueType {
    /// Options whose value is a Discord snowflake.
    pub fn is_discord_id(self) -> bool {
        matches!(
            self,
            ConfigValueType::TextChannel | ConfigValueType::CategoryChannel | ConfigValueType::Role
        )
    }

    /// Options the service expects as strings on the wire.
    pub fn sent_as_string(self) -> bool {
        self.is_discord_id() || matches!(self, ConfigValueType::Int | ConfigValueType::Float)
    }
}

/// One option of `GET /api/bot/{bot}/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: ConfigValueType,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_set: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type BotConfiguration = BTreeMap<String, ConfigEntry>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub configuration: BotConfiguration,
    #[serde(default)]
    pub total_options: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A staged change for one option, exactly as posted back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: ConfigValueType,
}

/// Per-key outcome inside a save response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSaveResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub kind: Option<ConfigValueType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSaveResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub results: BTreeMap<String, ConfigSaveResult>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    #[serde(default)]
    pub updated_count: Option<u64>,
    #[serde(default)]
    pub total_sent: Option<u64>,
}

impl ConfigSaveResponse {
    /// Message for a rejected save.
    pub fn error_message(&self) -> String {
        match &self.errors {
            Some(errors) if !errors.is_empty() => errors.join(", "),
            _ => "Failed to save configuration".to_string(),
        }
    }
}

/// `GET /dash/{bot}`: a few well-known fields plus whatever else the
/// service includes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub bot: Option<BotSummary>,
    #[serde(default)]
    pub payment: Option<PaymentStatus>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_paid: bool,
    #[serde(default)]
    pub last_payment: Option<Value>,
    #[serde(default)]
    pub last_payment_amount: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedBot {
    #[serde(deserialize_with = "lenient::required_id")]
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(deserialize_with = "lenient::required_id")]
    pub user_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub bot_id: Option<String>,
}
