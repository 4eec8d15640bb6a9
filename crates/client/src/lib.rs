//! Client side of the listing dashboards: the typed REST client, the
//! per-page state containers built on top of it, and seller re-sync.
//!
//! Views only talk to the service through the traits in [`api`], so the
//! HTTP implementation can be swapped for a double in tests or for another
//! transport when embedding.

pub mod api;
mod error;
pub mod http;
mod scope;
pub mod sync;
pub mod views;

pub use api::{BotApi, ProfileLookup, SellerApi, SessionApi, ShopApi};
pub use error::ClientError;
pub use http::HttpClient;
pub use scope::Scope;
pub use sync::{sync_requests, SyncDispatcher, SyncReport};
pub use views::{
    resolve_bot_name, AuthQueue, BotListings, BotOverview, ConfigEditor, Overview,
    SellerDashboard, ShopView, VouchView,
};
