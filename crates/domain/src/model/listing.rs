use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::lenient;

/// The three sellable item categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ListingKind {
    Account,
    Profile,
    Alt,
}

/// A single stat value. Networth-style stats arrive as abbreviated strings
/// (`"1.2b"`), levels as plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    /// Plain numeric reading: a text stat yields its leading number, so
    /// `"1k"` is `1`. Empty text is 0, text without a number is NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::Number(value) => *value,
            StatValue::Text(text) if text.trim().is_empty() => 0.0,
            StatValue::Text(text) => crate::filters::parse_float_prefix(text).unwrap_or(f64::NAN),
        }
    }

    /// Reading for networth stats, expanding `k`/`m`/`b`/`t` suffixes.
    pub fn as_abbreviated_f64(&self) -> f64 {
        match self {
            StatValue::Number(value) => *value,
            StatValue::Text(text) => crate::filters::unabbreviate_number(text),
        }
    }
}

pub type Stats = BTreeMap<String, Option<StatValue>>;

/// One listed account, profile or alt as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ListingKind>,
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub uuid: String,
    #[serde(default, deserialize_with = "lenient::optional_price")]
    pub number: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default, deserialize_with = "lenient::optional_price")]
    pub price: Option<i64>,
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub payment_methods: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_bool")]
    pub show_username: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_ign: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub listed_by: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub farming: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub mining: Option<bool>,
}

impl ListingItem {
    /// Builds a bare item; mostly useful for tests and fixtures.
    pub fn new(kind: ListingKind, uuid: impl Into<String>, number: i64) -> Self {
        Self {
            kind: Some(kind),
            uuid: uuid.into(),
            number: Some(number),
            username: String::new(),
            price: None,
            stats: None,
            payment_methods: None,
            additional_information: None,
            show_username: None,
            show_ign: None,
            listed_by: None,
            channel_id: None,
            message_id: None,
            profile: None,
            farming: None,
            mining: None,
        }
    }

    /// Deduplication key for an item found in the `kind` collection.
    pub fn key(&self, kind: ListingKind) -> ListingKey {
        match kind {
            ListingKind::Account | ListingKind::Profile => ListingKey::Standard {
                kind,
                uuid: self.uuid.clone(),
                number: self.number,
                profile: self
                    .profile
                    .clone()
                    .filter(|profile| !profile.is_empty())
                    .unwrap_or_else(|| "none".to_string()),
            },
            ListingKind::Alt => ListingKey::Alt {
                uuid: self.uuid.clone(),
                number: self.number,
                farming: self.farming,
                mining: self.mining,
            },
        }
    }

    /// Stat by name, `None` when missing or null.
    pub fn stat(&self, name: &str) -> Option<&StatValue> {
        self.stats.as_ref()?.get(name)?.as_ref()
    }

    /// Identifies the Discord message carrying this listing.
    pub fn message_ref(&self) -> Option<MessageRef> {
        Some(MessageRef {
            channel_id: self.channel_id.clone()?,
            message_id: self.message_id.clone()?,
        })
    }
}

/// Composite identity used to collapse the same listing reported by
/// several servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingKey {
    Standard {
        kind: ListingKind,
        uuid: String,
        number: Option<i64>,
        profile: String,
    },
    Alt {
        uuid: String,
        number: Option<i64>,
        farming: Option<bool>,
        mining: Option<bool>,
    },
}

/// Channel/message pair addressing a listing post; also the body of
/// `unlist/item`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

impl MessageRef {
    /// `channel-message`, the key used to track in-flight unlists.
    pub fn tracking_key(&self) -> String {
        format!("{}-{}", self.channel_id, self.message_id)
    }
}

/// Accounts, profiles and alts of one server (or of the bot itself).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingSet {
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing)]
    pub seller: bool,
    #[serde(default)]
    pub accounts: Vec<ListingItem>,
    #[serde(default)]
    pub profiles: Vec<ListingItem>,
    #[serde(default)]
    pub alts: Vec<ListingItem>,
}

impl ListingSet {
    pub fn collection(&self, kind: ListingKind) -> &[ListingItem] {
        match kind {
            ListingKind::Account => &self.accounts,
            ListingKind::Profile => &self.profiles,
            ListingKind::Alt => &self.alts,
        }
    }

    /// Items of every collection tagged with their kind.
    pub fn iter_all(&self) -> impl Iterator<Item = (ListingKind, &ListingItem)> {
        [ListingKind::Account, ListingKind::Profile, ListingKind::Alt]
            .into_iter()
            .flat_map(move |kind| self.collection(kind).iter().map(move |item| (kind, item)))
    }

    pub fn total(&self) -> usize {
        self.accounts.len() + self.profiles.len() + self.alts.len()
    }
}

/// Body of `GET /api/bot/{bot}/listed/items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListedItemsResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub data: ListingSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
