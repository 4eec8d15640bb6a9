//! Domain-level building blocks shared by the client library and the CLI.
//!
//! Everything here is pure: wire models, the transformations the dashboards
//! apply to fetched data (listing aggregation, configuration merging,
//! staged config edits, filters, vouch highlighting) and the ambient
//! services (environment configuration, telemetry, the user lookup cache).

pub mod aggregate;
pub mod bot_name;
pub mod config;
pub mod config_edits;
pub mod filters;
pub mod model;
pub mod seller_config;
pub mod services;
pub mod submission;
pub mod vouch;

pub use aggregate::{aggregate_listings, AggregatedListings, ServerListing};
pub use config::{
    hydrate_env_file, ClientConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_PROFILE_LOOKUP_URL,
};
pub use config_edits::{accepts_drop, display_name, AppliedSave, ConfigUpdates, DropItem};
pub use filters::{AuthActionFilter, ListingFilters, ShopCategory, TypeFilter};
pub use model::*;
pub use seller_config::{
    merge_seller_configuration, payment_methods_string, ConfigurationMerge, CorrectionDecision,
    CorrectionPrompt, FixedDecision, PaymentMethodReport, PAYMENT_METHOD_ALLOW_LIST,
};
pub use services::*;
pub use submission::{sync_request, ListItemPayload, ListRequest, ListingForm, SubmissionError};
