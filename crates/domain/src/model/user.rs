use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

const DISCORD_CDN: &str = "https://cdn.discordapp.com";

/// Mojang profile returned by the username lookup service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinecraftProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl MinecraftProfile {
    /// A name only counts as existing when both fields came back.
    pub fn exists(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }
}

/// One resolved Discord user, or `error` when the service could not look
/// the ID up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub discriminator: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub bot: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserInfo {
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.error.is_none()
    }

    /// Best name to show: display name, then username, then `fallback`.
    pub fn label<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.error.is_some() {
            return "Unknown User";
        }
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback)
    }
}

/// Body of `POST /api/bot/{bot}/users/info`. Depending on the endpoint
/// version `data` is keyed by ID or a plain list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersInfoResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<UsersInfoData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsersInfoData {
    Keyed(BTreeMap<String, UserInfo>),
    List(Vec<UserInfo>),
}

impl UsersInfoData {
    /// Normalises both shapes to an ID-keyed map. Keyed entries missing an
    /// `id` inherit their key.
    pub fn into_map(self) -> BTreeMap<String, UserInfo> {
        match self {
            UsersInfoData::Keyed(entries) => entries
                .into_iter()
                .map(|(key, mut info)| {
                    if info.id.is_empty() {
                        info.id.clone_from(&key);
                    }
                    (key, info)
                })
                .collect(),
            UsersInfoData::List(entries) => entries
                .into_iter()
                .map(|info| (info.id.clone(), info))
                .collect(),
        }
    }
}

/// Body of `GET /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub authenticated: bool,
    #[serde(default)]
    pub user_info: Option<SessionUser>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub discord_id: Option<String>,
}

impl SessionInfo {
    /// The logged-in user, only when the session is really authenticated.
    pub fn user(&self) -> Option<&SessionUser> {
        if self.authenticated {
            self.user_info.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, Value>,
}

impl SessionUser {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_deref()
            .filter(|hash| !hash.is_empty())
            .map(|hash| format!("{DISCORD_CDN}/avatars/{}/{hash}.png", self.id))
    }
}
