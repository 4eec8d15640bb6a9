//! Wire types for every payload exchanged with the listing-bot service.
//!
//! The service is loose about JSON types (IDs as numbers or strings, flags
//! as `0`/`1`), so decoding goes through the helpers in [`lenient`].

mod auth;
mod bot;
mod envelope;
mod guild;
pub mod lenient;
mod listing;
mod seller;
mod shop;
mod user;

pub use auth::{ActionStatus, ActionType, AuthAction, VerifyRequest, VerifyResponse};
pub use bot::{
    AuthorizedBot, AuthorizedUser, BotConfiguration, BotSummary, ConfigEntry, ConfigResponse,
    ConfigSaveResponse, ConfigSaveResult, ConfigUpdate, ConfigValueType, DashboardSummary,
    PaymentStatus,
};
pub use envelope::{Envelope, ServerResult, ServerResults};
pub use guild::{Category, Channel, ChannelsResponse, GuildChannels, Role, RolesResponse};
pub use listing::{
    ListedItemsResponse, ListingItem, ListingKey, ListingKind, ListingSet, MessageRef, StatValue,
    Stats,
};
pub use seller::{
    PaymentDetails, PaymentDetailsPatch, PaymentMethodsWire, SellauthPatch, SellauthSettings,
    SellerConfiguration, SellerConfigurationWire, SellerListings,
};
pub use shop::{
    BotNameResponse, DiscordMember, ShopGuild, ShopInfo, ShopItem, ShopSeller, TicketResponse,
    Vouch,
};
pub use user::{
    MinecraftProfile, SessionInfo, SessionUser, UserInfo, UsersInfoData, UsersInfoResponse,
};
