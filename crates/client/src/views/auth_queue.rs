use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
};

use listing_dash_domain::{AuthAction, AuthActionFilter, UserInfo, UserInfoCache};
use metrics::counter;
use tracing::{info, warn};

use super::{error_text, lock, prefetch_users};
use crate::{api::BotApi, ClientError, Scope};

#[derive(Default)]
struct QueueState {
    actions: Vec<AuthAction>,
    users: BTreeMap<String, UserInfo>,
    verifying: HashSet<String>,
    error: Option<String>,
    filter: AuthActionFilter,
}

/// Verification queue of one bot.
///
/// Verifying an action never edits the list locally: a confirmed
/// verification triggers a full refetch, anything else leaves the list as
/// it was and records the reason. A confirmed verification stays a success
/// even when that refetch fails.
pub struct AuthQueue {
    api: Arc<dyn BotApi>,
    cache: UserInfoCache,
    bot: String,
    scope: Scope,
    state: Mutex<QueueState>,
}

/// Clears the verifying mark however the verification ends.
struct VerifyingMark<'a> {
    state: &'a Mutex<QueueState>,
    action_id: &'a str,
}

impl Drop for VerifyingMark<'_> {
    fn drop(&mut self) {
        lock(self.state).verifying.remove(self.action_id);
    }
}

impl AuthQueue {
    pub fn new(api: Arc<dyn BotApi>, cache: UserInfoCache, bot: impl Into<String>) -> Self {
        Self {
            api,
            cache,
            bot: bot.into(),
            scope: Scope::new(),
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn bot(&self) -> &str {
        &self.bot
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetches the queue, then the users it mentions.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let fetched = self
            .scope
            .run(self.api.auth_actions(&self.bot))
            .await
            .map_err(|err| self.record(err))?;

        let mut ids: Vec<String> = Vec::new();
        for action in &fetched {
            if !action.user_id.is_empty() && !ids.contains(&action.user_id) {
                ids.push(action.user_id.clone());
            }
        }
        lock(&self.state).actions = fetched;

        let users = self
            .scope
            .run(async {
                Ok::<_, ClientError>(prefetch_users(
                    self.api.as_ref(),
                    &self.cache,
                    &self.bot,
                    ids.iter().map(String::as_str),
                )
                .await)
            })
            .await?;
        lock(&self.state).users.extend(users);
        Ok(())
    }

    pub async fn verify(&self, action_id: &str) -> Result<(), ClientError> {
        if !lock(&self.state).verifying.insert(action_id.to_string()) {
            return Err(ClientError::AlreadyVerifying(action_id.to_string()));
        }
        let _mark = VerifyingMark {
            state: &self.state,
            action_id,
        };

        let outcome = self
            .scope
            .run(self.api.verify_user(&self.bot, action_id))
            .await;

        match outcome {
            Ok(reply) if reply.success => {
                counter!("auth_verifications_total", "result" => "verified").increment(1);
                info!(bot = %self.bot, action_id, result = "verified", "verification finished");
                if let Err(err) = self.refresh().await {
                    warn!(bot = %self.bot, action_id, error = %err, "verified but refetch failed");
                }
                Ok(())
            }
            Ok(reply) => {
                counter!("auth_verifications_total", "result" => "rejected").increment(1);
                let message = reply
                    .error
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| "Failed to verify user".to_string());
                info!(bot = %self.bot, action_id, result = "rejected", %message, "verification finished");
                Err(self.record(ClientError::Rejected(message)))
            }
            Err(err) => {
                counter!("auth_verifications_total", "result" => "error").increment(1);
                info!(bot = %self.bot, action_id, result = "error", error = %err, "verification finished");
                Err(self.record(err))
            }
        }
    }

    pub fn is_verifying(&self, action_id: &str) -> bool {
        lock(&self.state).verifying.contains(action_id)
    }

    pub fn actions(&self) -> Vec<AuthAction> {
        lock(&self.state).actions.clone()
    }

    /// Actions passing the current filter, in fetched order.
    pub fn visible(&self) -> Vec<AuthAction> {
        let state = lock(&self.state);
        state.filter.apply(&state.actions).into_iter().cloned().collect()
    }

    pub fn set_filter(&self, filter: AuthActionFilter) {
        lock(&self.state).filter = filter;
    }

    pub fn user(&self, id: &str) -> Option<UserInfo> {
        lock(&self.state).users.get(id).cloned()
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
