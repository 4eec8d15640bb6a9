use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use listing_dash_domain::{
    bot_name::{choose_bot_name, is_custom_domain},
    vouch::{attributed_seller, filter_vouches, highlight, shop_sellers, vouch_timestamp, Segment, SellerRef},
    ShopCategory, ShopInfo, ShopItem, Vouch,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{error_text, lock};
use crate::{api::ShopApi, ClientError, Scope};

/// A vouch ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VouchView {
    pub vouch: Vouch,
    pub seller: Option<SellerRef>,
    pub segments: Vec<Segment>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct ShopState {
    shop: Option<ShopInfo>,
    error: Option<String>,
}

/// Public storefront of one bot.
pub struct ShopView {
    api: Arc<dyn ShopApi>,
    bot: String,
    scope: Scope,
    state: Mutex<ShopState>,
}

impl ShopView {
    pub fn new(api: Arc<dyn ShopApi>, bot: impl Into<String>) -> Self {
        Self {
            api,
            bot: bot.into(),
            scope: Scope::new(),
            state: Mutex::new(ShopState::default()),
        }
    }

    pub fn bot(&self) -> &str {
        &self.bot
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn load(&self) -> Result<ShopInfo, ClientError> {
        let shop = self
            .scope
            .run(self.api.shop_info(&self.bot))
            .await
            .map_err(|err| self.record(err))?;
        info!(
            bot = %self.bot,
            items = shop.all_items().count(),
            vouches = shop.vouches.len(),
            "shop loaded"
        );
        lock(&self.state).shop = Some(shop.clone());
        Ok(shop)
    }

    pub fn items(&self, category: ShopCategory) -> Vec<ShopItem> {
        let state = lock(&self.state);
        state
            .shop
            .as_ref()
            .map(|shop| category.items(shop).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sellers(&self) -> Vec<SellerRef> {
        lock(&self.state)
            .shop
            .as_ref()
            .map(shop_sellers)
            .unwrap_or_default()
    }

    /// Newest first, optionally narrowed to one seller.
    pub fn vouches(&self, seller: Option<&str>) -> Vec<VouchView> {
        let state = lock(&self.state);
        let Some(shop) = state.shop.as_ref() else {
            return Vec::new();
        };
        let sellers = shop_sellers(shop);
        filter_vouches(shop, seller)
            .into_iter()
            .map(|vouch| VouchView {
                seller: attributed_seller(&vouch.message, &sellers).cloned(),
                segments: highlight(&vouch.message, &sellers),
                timestamp: vouch_timestamp(vouch),
                vouch: vouch.clone(),
            })
            .collect()
    }

    /// Opens a purchase ticket and returns the URL to visit.
    pub async fn open_ticket(&self) -> Result<String, ClientError> {
        let ticket = self
            .scope
            .run(self.api.open_ticket(&self.bot))
            .await
            .map_err(|err| self.record(err))?;
        ticket
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| self.record(ClientError::Rejected("Failed to open ticket".into())))
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

/// Bot a page at `host` + `path` belongs to. Custom domains ask the
/// service first; a failed lookup falls back to the path.
pub async fn resolve_bot_name(api: &dyn ShopApi, host: &str, path: &str) -> Option<String> {
    let custom = if is_custom_domain(host) {
        match api.custom_bot_name(host).await {
            Ok(name) => name,
            Err(err) => {
                debug!(host, error = %err, "custom bot name lookup failed");
                None
            }
        }
    } else {
        None
    };
    choose_bot_name(custom, path)
}
