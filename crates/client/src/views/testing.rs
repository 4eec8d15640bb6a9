//! Hand-written [`BotApi`] double shared by the view tests.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use listing_dash_domain::{
    AuthAction, AuthorizedBot, AuthorizedUser, BotConfiguration, ConfigResponse,
    ConfigSaveResponse, ConfigUpdates, DashboardSummary, GuildChannels, ListingSet, MessageRef,
    Role, UserInfo, VerifyResponse,
};

use crate::{api::BotApi, ClientError};

#[derive(Default)]
pub(crate) struct MockBot {
    pub actions: Mutex<Vec<AuthAction>>,
    pub actions_down: AtomicBool,
    pub verify_reply: Mutex<Option<VerifyResponse>>,
    pub verify_delay: Option<Duration>,
    pub listings: Mutex<ListingSet>,
    pub listings_down: AtomicBool,
    pub unlist_error: Mutex<Option<String>>,
    pub config: Mutex<BotConfiguration>,
    pub channels: Mutex<GuildChannels>,
    pub roles: Mutex<Vec<Role>>,
    pub save_reply: Mutex<ConfigSaveResponse>,
    pub saved: Mutex<Vec<ConfigUpdates>>,
    pub users: Mutex<BTreeMap<String, UserInfo>>,
    pub user_requests: Mutex<Vec<Vec<String>>>,
    pub action_fetches: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub listing_fetches: AtomicUsize,
    pub unlist_calls: AtomicUsize,
}

impl MockBot {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub(crate) fn user(id: &str, name: &str) -> UserInfo {
    UserInfo {
        id: id.into(),
        name: Some(name.into()),
        ..UserInfo::default()
    }
}

#[async_trait]
impl BotApi for MockBot {
    async fn dashboard(&self, _bot: &str) -> Result<DashboardSummary, ClientError> {
        Ok(DashboardSummary::default())
    }

    async fn authorized_bots(&self, _bot: &str) -> Result<Vec<AuthorizedBot>, ClientError> {
        Ok(vec![AuthorizedBot {
            client_id: "900".into(),
        }])
    }

    async fn authorized_users(&self, _bot: &str) -> Result<Vec<AuthorizedUser>, ClientError> {
        Ok(vec![AuthorizedUser {
            user_id: "1".into(),
            ip_address: None,
            bot_id: Some("900".into()),
        }])
    }

    async fn config(&self, _bot: &str) -> Result<ConfigResponse, ClientError> {
        Ok(ConfigResponse {
            success: true,
            configuration: self.config.lock().unwrap().clone(),
            total_options: None,
            error: None,
        })
    }

    async fn save_config(
        &self,
        _bot: &str,
        updates: &ConfigUpdates,
    ) -> Result<ConfigSaveResponse, ClientError> {
        self.saved.lock().unwrap().push(updates.clone());
        Ok(self.save_reply.lock().unwrap().clone())
    }

    async fn channels(&self, _bot: &str) -> Result<GuildChannels, ClientError> {
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn roles(&self, _bot: &str) -> Result<Vec<Role>, ClientError> {
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn auth_actions(&self, _bot: &str) -> Result<Vec<AuthAction>, ClientError> {
        self.action_fetches.fetch_add(1, Ordering::SeqCst);
        if self.actions_down.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 503,
                message: "queue unavailable".into(),
            });
        }
        Ok(self.actions.lock().unwrap().clone())
    }

    async fn verify_user(
        &self,
        _bot: &str,
        action_id: &str,
    ) -> Result<VerifyResponse, ClientError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.verify_delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .verify_reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::Transport("connection reset".into()))?;
        if reply.success {
            for action in self.actions.lock().unwrap().iter_mut() {
                if action.action_id == action_id {
                    action.resolved = true;
                }
            }
        }
        Ok(reply)
    }

    async fn listed_items(&self, _bot: &str) -> Result<ListingSet, ClientError> {
        self.listing_fetches.fetch_add(1, Ordering::SeqCst);
        if self.listings_down.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 502,
                message: "listings unavailable".into(),
            });
        }
        Ok(self.listings.lock().unwrap().clone())
    }

    async fn unlist_item(&self, _bot: &str, message: &MessageRef) -> Result<(), ClientError> {
        self.unlist_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(detail) = self.unlist_error.lock().unwrap().clone() {
            return Err(ClientError::Status {
                status: 404,
                message: detail,
            });
        }
        let mut guard = self.listings.lock().unwrap();
        let listings = &mut *guard;
        for collection in [
            &mut listings.accounts,
            &mut listings.profiles,
            &mut listings.alts,
        ] {
            collection.retain(|item| item.message_ref().as_ref() != Some(message));
        }
        Ok(())
    }

    async fn users_info(
        &self,
        _bot: &str,
        ids: &[String],
    ) -> Result<BTreeMap<String, UserInfo>, ClientError> {
        self.user_requests.lock().unwrap().push(ids.to_vec());
        let known = self.users.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                let info = known.get(id).cloned().unwrap_or_else(|| UserInfo {
                    error: Some("Unknown user".into()),
                    ..UserInfo::unknown(id.clone())
                });
                (id.clone(), info)
            })
            .collect())
    }
}
