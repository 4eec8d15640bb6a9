//! Staged edits to a bot's configuration map.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::model::{
    BotConfiguration, ConfigSaveResponse, ConfigUpdate, ConfigValueType, GuildChannels, Role,
};

/// What is being dropped onto a channel/category/role slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropItem<'a> {
    /// A channel together with its Discord channel type (`text`, `voice`..).
    Channel { id: &'a str, channel_type: &'a str },
    Category { id: &'a str },
    Role { id: &'a str },
}

impl DropItem<'_> {
    fn id(&self) -> &str {
        match self {
            DropItem::Channel { id, .. } | DropItem::Category { id } | DropItem::Role { id } => id,
        }
    }
}

/// Whether `item` may fill an option of type `target`.
pub fn accepts_drop(target: ConfigValueType, item: &DropItem<'_>) -> bool {
    matches!(
        (target, item),
        (ConfigValueType::TextChannel, DropItem::Channel { channel_type: "text", .. })
            | (ConfigValueType::CategoryChannel, DropItem::Category { .. })
            | (ConfigValueType::Role, DropItem::Role { .. })
    )
}

/// Brings a raw value into the shape the service expects: snowflakes and
/// numbers travel as strings, `null` clears the option.
pub fn coerce_value(kind: ConfigValueType, value: Value) -> Value {
    if !kind.sent_as_string() {
        return value;
    }
    match value {
        Value::Null => Value::Null,
        Value::String(text) => Value::String(text),
        other => Value::String(other.to_string()),
    }
}

/// Only the changed keys, exactly as posted to the config endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigUpdates {
    updates: BTreeMap<String, ConfigUpdate>,
}

/// What a save changed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedSave {
    pub applied: Vec<String>,
    /// Staged keys the service did not confirm; they are discarded.
    pub unconfirmed: Vec<String>,
}

impl ConfigUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `value` for `key`, replacing any earlier staged value.
    pub fn stage(&mut self, key: impl Into<String>, value: Value, kind: ConfigValueType) {
        let value = coerce_value(kind, value);
        self.updates.insert(key.into(), ConfigUpdate { value, kind });
    }

    /// Stages a drag-and-drop assignment if `item` fits `kind`. Returns
    /// whether anything was staged.
    pub fn stage_drop(&mut self, key: &str, kind: ConfigValueType, item: &DropItem<'_>) -> bool {
        if !accepts_drop(kind, item) {
            return false;
        }
        self.stage(key, Value::String(item.id().to_string()), kind);
        true
    }

    pub fn discard(&mut self, key: &str) -> Option<ConfigUpdate> {
        self.updates.remove(key)
    }

    pub fn is_modified(&self, key: &str) -> bool {
        self.updates.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigUpdate> {
        self.updates.get(key)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    /// Value shown for `key`: the staged edit first, then the stored value.
    pub fn current_value<'a>(&'a self, config: &'a BotConfiguration, key: &str) -> Option<&'a Value> {
        self.updates
            .get(key)
            .map(|update| &update.value)
            .or_else(|| config.get(key).map(|entry| &entry.value))
    }

    /// Merges a successful save into `config`: only keys present in
    /// `results` change, and they become `is_set`. Clears the staged diff.
    pub fn apply_save(&mut self, config: &mut BotConfiguration, response: &ConfigSaveResponse) -> AppliedSave {
        let mut outcome = AppliedSave::default();
        for (key, _) in std::mem::take(&mut self.updates) {
            match (response.results.get(&key), config.get_mut(&key)) {
                (Some(result), Some(entry)) => {
                    entry.value = result.value.clone();
                    entry.is_set = true;
                    outcome.applied.push(key);
                }
                _ => outcome.unconfirmed.push(key),
            }
        }
        outcome
    }
}

/// Human name of a channel, category or role ID, if the layout knows it.
pub fn display_name<'a>(
    id: &str,
    kind: ConfigValueType,
    channels: &'a GuildChannels,
    roles: &'a [Role],
) -> Option<&'a str> {
    if id.is_empty() {
        return None;
    }
    match kind {
        ConfigValueType::TextChannel => channels.find_channel(id).map(|c| c.name.as_str()),
        ConfigValueType::CategoryChannel => channels.find_category(id).map(|c| c.name.as_str()),
        ConfigValueType::Role => roles.iter().find(|r| r.id == id).map(|r| r.name.as_str()),
        _ => None,
    }
}

/// String form of a config value for display and ID lookups.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigEntry;
    use serde_json::json;

    fn config() -> BotConfiguration {
        serde_json::from_value(json!({
            "log_channel": {"value": null, "type": "TextChannel", "description": "Logs", "is_set": false},
            "max_listings": {"value": "5", "type": "int", "description": "Cap", "is_set": true},
            "auto_bump": {"value": false, "type": "bool", "description": "Bump", "is_set": false}
        }))
        .unwrap()
    }

    #[test]
    fn ids_and_numbers_are_staged_as_strings() {
        let mut updates = ConfigUpdates::new();
        updates.stage("max_listings", json!(12), ConfigValueType::Int);
        updates.stage("auto_bump", json!(true), ConfigValueType::Bool);
        updates.stage("log_channel", Value::Null, ConfigValueType::TextChannel);

        let wire = serde_json::to_value(&updates).unwrap();
        assert_eq!(wire["max_listings"], json!({"value": "12", "type": "int"}));
        assert_eq!(wire["auto_bump"], json!({"value": true, "type": "bool"}));
        assert_eq!(wire["log_channel"]["value"], Value::Null);
    }

    #[test]
    fn drop_validity_matches_slot_type() {
        let text = DropItem::Channel { id: "1", channel_type: "text" };
        let voice = DropItem::Channel { id: "2", channel_type: "voice" };
        let category = DropItem::Category { id: "3" };
        let role = DropItem::Role { id: "4" };

        assert!(accepts_drop(ConfigValueType::TextChannel, &text));
        assert!(!accepts_drop(ConfigValueType::TextChannel, &voice));
        assert!(!accepts_drop(ConfigValueType::TextChannel, &category));
        assert!(accepts_drop(ConfigValueType::CategoryChannel, &category));
        assert!(accepts_drop(ConfigValueType::Role, &role));
        assert!(!accepts_drop(ConfigValueType::Role, &text));

        let mut updates = ConfigUpdates::new();
        assert!(!updates.stage_drop("log_channel", ConfigValueType::TextChannel, &voice));
        assert!(updates.stage_drop("log_channel", ConfigValueType::TextChannel, &text));
        assert_eq!(updates.get("log_channel").map(|u| &u.value), Some(&json!("1")));
    }

    #[test]
    fn current_value_prefers_staged_edits() {
        let config = config();
        let mut updates = ConfigUpdates::new();
        assert_eq!(updates.current_value(&config, "max_listings"), Some(&json!("5")));
        updates.stage("max_listings", json!("9"), ConfigValueType::Int);
        assert_eq!(updates.current_value(&config, "max_listings"), Some(&json!("9")));
        assert!(updates.is_modified("max_listings"));
        assert_eq!(updates.current_value(&config, "missing"), None);
    }

    #[test]
    fn only_confirmed_keys_merge() {
        let mut config = config();
        let mut updates = ConfigUpdates::new();
        updates.stage("log_channel", json!("77"), ConfigValueType::TextChannel);
        updates.stage("auto_bump", json!(true), ConfigValueType::Bool);

        let response: ConfigSaveResponse = serde_json::from_value(json!({
            "success": true,
            "results": {"log_channel": {"status": "updated", "value": "77", "type": "TextChannel"}},
            "updated_count": 1,
            "total_sent": 2
        }))
        .unwrap();

        let outcome = updates.apply_save(&mut config, &response);
        assert_eq!(outcome.applied, vec!["log_channel"]);
        assert_eq!(outcome.unconfirmed, vec!["auto_bump"]);
        assert!(updates.is_empty());

        let log: &ConfigEntry = &config["log_channel"];
        assert_eq!(log.value, json!("77"));
        assert!(log.is_set);
        assert_eq!(config["auto_bump"].value, json!(false));
        assert!(!config["auto_bump"].is_set);
    }

    #[test]
    fn display_names_resolve_through_layout() {
        let channels: GuildChannels = serde_json::from_value(json!({
            "standalone_channels": [],
            "categories": [{"id": "10", "name": "Shop", "channels": [
                {"id": "11", "name": "accounts", "type": "text"}
            ]}]
        }))
        .unwrap();
        let roles: Vec<Role> = serde_json::from_value(json!([{"id": "5", "name": "Seller"}])).unwrap();

        assert_eq!(display_name("11", ConfigValueType::TextChannel, &channels, &roles), Some("accounts"));
        assert_eq!(display_name("10", ConfigValueType::CategoryChannel, &channels, &roles), Some("Shop"));
        assert_eq!(display_name("5", ConfigValueType::Role, &channels, &roles), Some("Seller"));
        assert_eq!(display_name("5", ConfigValueType::Int, &channels, &roles), None);
        assert_eq!(value_text(&json!(42)), "42");
    }
}
