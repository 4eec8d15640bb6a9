use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
};

use listing_dash_domain::{
    ListingFilters, ListingItem, ListingKind, ListingSet, MessageRef, UserInfo, UserInfoCache,
};

use tracing::warn;

use super::{error_text, lock, prefetch_users};
use crate::{api::BotApi, ClientError, Scope};

#[derive(Default)]
struct ListingsState {
    listings: ListingSet,
    users: BTreeMap<String, UserInfo>,
    unlisting: HashSet<String>,
    filters: ListingFilters,
    error: Option<String>,
}

/// Items a bot currently has listed, with the owner's filters.
pub struct BotListings {
    api: Arc<dyn BotApi>,
    cache: UserInfoCache,
    bot: String,
    scope: Scope,
    state: Mutex<ListingsState>,
}

struct UnlistingMark<'a> {
    state: &'a Mutex<ListingsState>,
    key: String,
}

impl Drop for UnlistingMark<'_> {
    fn drop(&mut self) {
        lock(self.state).unlisting.remove(&self.key);
    }
}

impl BotListings {
    pub fn new(api: Arc<dyn BotApi>, cache: UserInfoCache, bot: impl Into<String>) -> Self {
        Self {
            api,
            cache,
            bot: bot.into(),
            scope: Scope::new(),
            state: Mutex::new(ListingsState::default()),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetches the listings and the sellers who listed them.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let listings = self
            .scope
            .run(self.api.listed_items(&self.bot))
            .await
            .map_err(|err| self.record(err))?;

        let mut sellers: Vec<String> = Vec::new();
        for (_, item) in listings.iter_all() {
            if let Some(id) = item.listed_by.as_ref().filter(|id| !id.is_empty()) {
                if !sellers.contains(id) {
                    sellers.push(id.clone());
                }
            }
        }
        lock(&self.state).listings = listings;

        let users = self
            .scope
            .run(async {
                Ok::<_, ClientError>(prefetch_users(
                    self.api.as_ref(),
                    &self.cache,
                    &self.bot,
                    sellers.iter().map(String::as_str),
                )
                .await)
            })
            .await?;
        lock(&self.state).users.extend(users);
        Ok(())
    }

    /// Removes the post behind `message` and refetches. Returns `false`
    /// without sending anything when that post is already being unlisted.
    /// A failed refetch after the removal is recorded, not returned.
    pub async fn unlist(&self, message: &MessageRef) -> Result<bool, ClientError> {
        let key = message.tracking_key();
        if !lock(&self.state).unlisting.insert(key.clone()) {
            return Ok(false);
        }
        let _mark = UnlistingMark {
            state: &self.state,
            key,
        };

        self.scope
            .run(self.api.unlist_item(&self.bot, message))
            .await
            .map_err(|err| match err {
                ClientError::Status { message, .. } => {
                    self.record(ClientError::Rejected(format!("Failed to unlist item: {message}")))
                }
                other => self.record(other),
            })?;
        if let Err(err) = self.refresh().await {
            warn!(bot = %self.bot, error = %err, "item unlisted but refetch failed");
        }
        Ok(true)
    }

    pub fn is_unlisting(&self, message: &MessageRef) -> bool {
        lock(&self.state).unlisting.contains(&message.tracking_key())
    }

    pub fn set_filters(&self, filters: ListingFilters) {
        lock(&self.state).filters = filters;
    }

    pub fn listings(&self) -> ListingSet {
        lock(&self.state).listings.clone()
    }

    /// Items passing the current filters: accounts, then alts, then
    /// profiles.
    pub fn visible(&self) -> Vec<(ListingKind, ListingItem)> {
        let state = lock(&self.state);
        state
            .filters
            .apply(&state.listings)
            .into_iter()
            .map(|(kind, item)| (kind, item.clone()))
            .collect()
    }

    pub fn seller(&self, id: &str) -> Option<UserInfo> {
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
