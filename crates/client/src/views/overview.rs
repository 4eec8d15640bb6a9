use std::{collections::BTreeMap, sync::Arc};

use futures_util::join;
use listing_dash_domain::{AuthorizedBot, AuthorizedUser, DashboardSummary, UserInfo, UserInfoCache};
use serde::Serialize;
use tracing::warn;

use super::prefetch_users;
use crate::{api::BotApi, ClientError, Scope};

/// Landing page data for one bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub summary: DashboardSummary,
    /// Client IDs of the bots the session may manage.
    pub authorized_bots: Vec<String>,
    pub authorized_users: Vec<AuthorizedUser>,
    pub users: BTreeMap<String, UserInfo>,
}

pub struct BotOverview {
    api: Arc<dyn BotApi>,
    cache: UserInfoCache,
    bot: String,
    scope: Scope,
}

impl BotOverview {
    pub fn new(api: Arc<dyn BotApi>, cache: UserInfoCache, bot: impl Into<String>) -> Self {
        Self {
            api,
            cache,
            bot: bot.into(),
            scope: Scope::new(),
        }
    }

    /// The summary must load; the authorization lists are best effort and
    /// come back empty when their endpoints fail.
    pub async fn load(&self) -> Result<Overview, ClientError> {
        let summary = self.scope.run(self.api.dashboard(&self.bot)).await?;

        let (bots, users) = self
            .scope
            .run(async {
                Ok::<_, ClientError>(join!(
                    self.api.authorized_bots(&self.bot),
                    self.api.authorized_users(&self.bot)
                ))
            })
            .await?;
        let authorized_bots: Vec<String> = bots
            .unwrap_or_else(|err| {
                warn!(bot = %self.bot, error = %err, "authorized bots unavailable");
                Vec::new()
            })
            .into_iter()
            .map(|AuthorizedBot { client_id }| client_id)
            .collect();
        let authorized_users = users.unwrap_or_else(|err| {
            warn!(bot = %self.bot, error = %err, "authorized users unavailable");
            Vec::new()
        });

        // Users, the bots they authorized through, and the bot owners.
        let mut ids: Vec<String> = Vec::new();
        let candidates = authorized_users
            .iter()
            .flat_map(|user| [Some(&user.user_id), user.bot_id.as_ref()])
            .flatten()
            .chain(authorized_bots.iter());
        for id in candidates {
            if !id.is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        let users = self
            .scope
            .run(async {
                Ok::<_, ClientError>(
                    prefetch_users(
                        self.api.as_ref(),
                        &self.cache,
                        &self.bot,
                        ids.iter().map(String::as_str),
                    )
                    .await,
                )
            })
            .await?;

        Ok(Overview {
            summary,
            authorized_bots,
            authorized_users,
            users,
        })
    }
}
