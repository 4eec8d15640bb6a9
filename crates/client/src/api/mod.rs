//! Seams between the views and the remote service. [`crate::HttpClient`]
//! implements all of them; tests substitute hand-written mocks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use listing_dash_domain::{
    AuthAction, AuthorizedBot, AuthorizedUser, ConfigResponse, ConfigSaveResponse, ConfigUpdates,
    DashboardSummary, GuildChannels, ListRequest, ListingSet, MessageRef, MinecraftProfile, Role,
    SellerConfiguration, SellerConfigurationWire, SellerListings, ServerResults, SessionInfo,
    ShopInfo, TicketResponse, UserInfo, VerifyResponse,
};
use serde_json::Value;

use crate::ClientError;

#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn me(&self) -> Result<SessionInfo, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
    /// Discord login URL that sends the browser back to `redirect`.
    fn login_url(&self, redirect: &str) -> Result<String, ClientError>;
}

/// Owner-only endpoints under `/api/bot/{bot}` (plus `/dash/{bot}`).
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn dashboard(&self, bot: &str) -> Result<DashboardSummary, ClientError>;
    async fn authorized_bots(&self, bot: &str) -> Result<Vec<AuthorizedBot>, ClientError>;
    async fn authorized_users(&self, bot: &str) -> Result<Vec<AuthorizedUser>, ClientError>;
    async fn config(&self, bot: &str) -> Result<ConfigResponse, ClientError>;
    /// Posts the staged diff. A `success: false` body is returned as-is so
    /// the caller can keep its diff and show the server's errors.
    async fn save_config(
        &self,
        bot: &str,
        updates: &ConfigUpdates,
    ) -> Result<ConfigSaveResponse, ClientError>;
    async fn channels(&self, bot: &str) -> Result<GuildChannels, ClientError>;
    async fn roles(&self, bot: &str) -> Result<Vec<Role>, ClientError>;
    async fn auth_actions(&self, bot: &str) -> Result<Vec<AuthAction>, ClientError>;
    async fn verify_user(&self, bot: &str, action_id: &str)
        -> Result<VerifyResponse, ClientError>;
    async fn listed_items(&self, bot: &str) -> Result<ListingSet, ClientError>;
    async fn unlist_item(&self, bot: &str, message: &MessageRef) -> Result<(), ClientError>;
    async fn users_info(
        &self,
        bot: &str,
        ids: &[String],
    ) -> Result<BTreeMap<String, UserInfo>, ClientError>;
}

/// Endpoints under `/api/seller`, answered once per listing server.
#[async_trait]
pub trait SellerApi: Send + Sync {
    async fn accounts(&self) -> Result<ServerResults<SellerListings>, ClientError>;
    async fn configuration(&self) -> Result<ServerResults<SellerConfigurationWire>, ClientError>;
    /// Posts the whole merged form; the reply is informational.
    async fn save_configuration(
        &self,
        configuration: &SellerConfiguration,
    ) -> Result<Value, ClientError>;
    async fn list_item(&self, request: &ListRequest) -> Result<Value, ClientError>;
}

/// Public storefront endpoints; no session needed.
#[async_trait]
pub trait ShopApi: Send + Sync {
    async fn shop_info(&self, bot: &str) -> Result<ShopInfo, ClientError>;
    async fn open_ticket(&self, bot: &str) -> Result<TicketResponse, ClientError>;
    /// Bot served on a custom domain, looked up by `Host`.
    async fn custom_bot_name(&self, host: &str) -> Result<Option<String>, ClientError>;
}

/// Third-party Mojang profile lookup, used to check that a username
/// exists before listing it.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// `None` when the lookup service does not know the name.
    async fn profile(&self, username: &str) -> Result<Option<MinecraftProfile>, ClientError>;
}
