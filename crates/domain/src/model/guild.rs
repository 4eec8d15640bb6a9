use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "lenient::required_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `text`, `voice`, `stage`, `forum`, ...
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub position: i64,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "lenient::required_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Channel layout of the bot's guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildChannels {
    #[serde(default)]
    pub standalone_channels: Vec<Channel>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl GuildChannels {
    /// Looks a channel up among standalone channels first, then inside
    /// categories.
    pub fn find_channel(&self, id: &str) -> Option<&Channel> {
        self.standalone_channels
            .iter()
            .chain(self.categories.iter().flat_map(|category| category.channels.iter()))
            .find(|channel| channel.id == id)
    }

    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(deserialize_with = "lenient::required_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub color: i64,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub hoist: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub mentionable: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub managed: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub permissions: Option<String>,
}

impl Role {
    /// `#rrggbb`, or `None` for the uncoloured default.
    pub fn hex_color(&self) -> Option<String> {
        (self.color != 0).then(|| format!("#{:06x}", self.color))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelsResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub data: GuildChannels,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolesResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub error: Option<String>,
}
