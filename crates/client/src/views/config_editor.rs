use std::sync::{Arc, Mutex};

use futures_util::join;
use listing_dash_domain::{
    config_edits, AppliedSave, BotConfiguration, ConfigUpdates, ConfigValueType, DropItem,
    GuildChannels, Role,
};
use serde_json::Value;
use tracing::info;

use super::{error_text, lock};
use crate::{api::BotApi, ClientError, Scope};

#[derive(Default)]
struct EditorState {
    config: BotConfiguration,
    channels: GuildChannels,
    roles: Vec<Role>,
    updates: ConfigUpdates,
    error: Option<String>,
}

/// Bot configuration editor: the stored options, the guild layout used to
/// fill ID options, and the edits staged on top.
pub struct ConfigEditor {
    api: Arc<dyn BotApi>,
    bot: String,
    scope: Scope,
    state: Mutex<EditorState>,
}

impl ConfigEditor {
    pub fn new(api: Arc<dyn BotApi>, bot: impl Into<String>) -> Self {
        Self {
            api,
            bot: bot.into(),
            scope: Scope::new(),
            state: Mutex::new(EditorState::default()),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetches options, channels and roles together. Staged edits survive
    /// a reload.
    pub async fn load(&self) -> Result<(), ClientError> {
        let fetched = self
            .scope
            .run(async {
                let (config, channels, roles) = join!(
                    self.api.config(&self.bot),
                    self.api.channels(&self.bot),
                    self.api.roles(&self.bot)
                );
                Ok::<_, ClientError>((config?, channels?, roles?))
            })
            .await
            .map_err(|err| self.record(err))?;

        let (config, channels, roles) = fetched;
        let mut state = lock(&self.state);
        state.config = config.configuration;
        state.channels = channels;
        state.roles = roles;
        Ok(())
    }

    pub fn configuration(&self) -> BotConfiguration {
        lock(&self.state).config.clone()
    }

    pub fn kind_of(&self, key: &str) -> Option<ConfigValueType> {
        lock(&self.state).config.get(key).map(|entry| entry.kind)
    }

    /// Stages `value` for an existing option. Returns `false` for unknown
    /// keys.
    pub fn stage(&self, key: &str, value: Value) -> bool {
        let mut state = lock(&self.state);
        let Some(kind) = state.config.get(key).map(|entry| entry.kind) else {
            return false;
        };
        state.updates.stage(key, value, kind);
        true
    }

    /// Stages a dragged channel, category or role if the option accepts it.
    pub fn stage_drop(&self, key: &str, item: &DropItem<'_>) -> bool {
        let mut state = lock(&self.state);
        let Some(kind) = state.config.get(key).map(|entry| entry.kind) else {
            return false;
        };
        state.updates.stage_drop(key, kind, item)
    }

    pub fn discard(&self, key: &str) {
        lock(&self.state).updates.discard(key);
    }

    pub fn pending(&self) -> ConfigUpdates {
        lock(&self.state).updates.clone()
    }

    pub fn is_modified(&self, key: &str) -> bool {
        lock(&self.state).updates.is_modified(key)
    }

    pub fn current_value(&self, key: &str) -> Option<Value> {
        let state = lock(&self.state);
        state.updates.current_value(&state.config, key).cloned()
    }

    /// Name of the channel, category or role held by `key`, if any.
    pub fn display_name(&self, key: &str) -> Option<String> {
        let state = lock(&self.state);
        let kind = state.config.get(key)?.kind;
        let value = state.updates.current_value(&state.config, key)?;
        let id = config_edits::value_text(value);
        config_edits::display_name(&id, kind, &state.channels, &state.roles).map(str::to_string)
    }

    /// Posts the staged diff. Nothing is sent when it is empty. On
    /// success the confirmed keys are merged and the sent edits dropped; on
    /// rejection the diff stays for another attempt.
    pub async fn save(&self) -> Result<Option<AppliedSave>, ClientError> {
        let snapshot = lock(&self.state).updates.clone();
        if snapshot.is_empty() {
            return Ok(None);
        }

        let response = self
            .scope
            .run(self.api.save_config(&self.bot, &snapshot))
            .await
            .map_err(|err| self.record(err))?;

        if !response.success {
            return Err(self.record(ClientError::Rejected(response.error_message())));
        }

        let mut state = lock(&self.state);
        let mut sent = snapshot.clone();
        let applied = sent.apply_save(&mut state.config, &response);
        // Keys re-edited while the save was in flight keep their new value.
        for key in applied.applied.iter().chain(&applied.unconfirmed) {
            if state.updates.get(key) == snapshot.get(key) {
                state.updates.discard(key);
            }
        }
        info!(
            bot = %self.bot,
            applied = applied.applied.len(),
            unconfirmed = applied.unconfirmed.len(),
            "configuration saved"
        );
        Ok(Some(applied))
    }

    pub fn take_error(&self) -> Option<String> {
        lock(&self.state).error.take()
    }

    fn record(&self, err: ClientError) -> ClientError {
        if let Some(message) = error_text(&err) {
            lock(&self.state).error = Some(message);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use listing_dash_domain::ConfigSaveResponse;
    use serde_json::json;

    use super::*;
    use crate::views::testing::MockBot;

    fn mock() -> Arc<MockBot> {
        let api = Arc::new(MockBot::default());
        *api.config.lock().unwrap() = serde_json::from_value(json!({
            "log_channel": {"value": null, "type": "TextChannel", "description": "Logs", "is_set": false},
            "seller_role": {"value": "5", "type": "Role", "description": "Sellers", "is_set": true},
            "max_listings": {"value": "5", "type": "int", "description": "Cap", "is_set": true}
        }))
        .unwrap();
        *api.channels.lock().unwrap() = serde_json::from_value(json!({
            "standalone_channels": [{"id": "11", "name": "logs", "type": "text"}],
            "categories": []
        }))
        .unwrap();
        *api.roles.lock().unwrap() =
            serde_json::from_value(json!([{"id": "5", "name": "Seller"}])).unwrap();
        api
    }

    #[tokio::test]
    async fn empty_diff_is_not_sent() {
        let api = mock();
        let editor = ConfigEditor::new(api.clone(), "alpha");
        editor.load().await.unwrap();

        assert_eq!(editor.save().await.unwrap(), None);
        assert!(api.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn staged_values_resolve_names_and_merge_on_save() {
        let api = mock();
        *api.save_reply.lock().unwrap() = serde_json::from_value(json!({
            "success": true,
            "results": {"log_channel": {"status": "updated", "value": "11", "type": "TextChannel"}}
        }))
        .unwrap();
        let editor = ConfigEditor::new(api.clone(), "alpha");
        editor.load().await.unwrap();

        assert_eq!(editor.display_name("seller_role").as_deref(), Some("Seller"));
        assert!(!editor.stage_drop("log_channel", &DropItem::Role { id: "5" }));
        assert!(editor.stage_drop(
            "log_channel",
            &DropItem::Channel {
                id: "11",
                channel_type: "text"
            }
        ));
        assert!(editor.stage("max_listings", json!(8)));
        assert!(!editor.stage("nope", json!(1)));
        assert_eq!(editor.display_name("log_channel").as_deref(), Some("logs"));
        assert_eq!(editor.current_value("max_listings"), Some(json!("8")));

        let applied = editor.save().await.unwrap().unwrap();

        assert_eq!(applied.applied, vec!["log_channel"]);
        assert_eq!(applied.unconfirmed, vec!["max_listings"]);
        assert_eq!(api.saved.lock().unwrap()[0].len(), 2);
        let config = editor.configuration();
        assert!(config["log_channel"].is_set);
        assert_eq!(config["log_channel"].value, json!("11"));
        assert_eq!(config["max_listings"].value, json!("5"));
        assert!(editor.pending().is_empty());
    }

    #[tokio::test]
    async fn rejected_save_keeps_diff() {
        let api = mock();
        *api.save_reply.lock().unwrap() = ConfigSaveResponse {
            success: false,
            errors: Some(vec!["log_channel: unknown channel".into(), "rate limited".into()]),
            ..ConfigSaveResponse::default()
        };
        let editor = ConfigEditor::new(api.clone(), "alpha");
        editor.load().await.unwrap();
        editor.stage("log_channel", json!("999"));

        let result = editor.save().await;

        assert!(matches!(result, Err(ClientError::Rejected(_))));
        assert!(editor.is_modified("log_channel"));
        assert_eq!(
            editor.take_error().as_deref(),
            Some("log_channel: unknown channel, rate limited")
        );
    }
}
