//! State containers, one per dashboard page. Each view owns a
//! [`Scope`](crate::Scope) so dropping it cancels whatever it still has in
//! flight, and keeps the last failure as a dismissible message.

mod auth_queue;
mod config_editor;
mod listings;
mod overview;
mod seller;
mod shop;
#[cfg(test)]
mod testing;

pub use auth_queue::AuthQueue;
pub use config_editor::ConfigEditor;
pub use listings::BotListings;
pub use overview::{BotOverview, Overview};
pub use seller::SellerDashboard;
pub use shop::{resolve_bot_name, ShopView, VouchView};

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use listing_dash_domain::{UserInfo, UserInfoCache};
use tracing::warn;

use crate::{api::BotApi, ClientError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Message kept for the user; cancellations are not worth showing.
fn error_text(err: &ClientError) -> Option<String> {
    match err {
        ClientError::Cancelled => None,
        other => Some(other.to_string()),
    }
}

/// Resolves `ids` through the shared cache, asking the service only for
/// the ones it does not hold yet. Lookup failures are logged and leave the
/// result partial.
async fn prefetch_users<'a>(
    api: &dyn BotApi,
    cache: &UserInfoCache,
    bot: &str,
    ids: impl IntoIterator<Item = &'a str> + Clone,
) -> BTreeMap<String, UserInfo> {
    let missing = cache.missing(ids.clone());
    let mut fetched = BTreeMap::new();
    if !missing.is_empty() {
        match api.users_info(bot, &missing).await {
            Ok(users) => fetched = users,
            Err(err) => warn!(bot, requested = missing.len(), error = %err, "user lookup failed"),
        }
    }
    cache.insert_all(fetched.values().cloned());

    let mut users = cache.lookup(ids);
    users.extend(fetched);
    users
}
