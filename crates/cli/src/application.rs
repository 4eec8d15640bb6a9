use std::{collections::BTreeMap, sync::Arc};

use listing_dash_client::{
    resolve_bot_name, AuthQueue, BotListings, BotOverview, ClientError, ConfigEditor,
    HttpClient, SellerDashboard, SessionApi, ShopView,
};
use listing_dash_domain::{
    init_telemetry, AuthActionFilter, ClientConfig, ConfigError, ShopCategory, TelemetryConfig,
    TelemetryError, UserInfoCache,
};
use serde::Serialize;
use serde_json::{json, Value};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::debug;

use crate::commands::{usage, Command, StdinPrompt, UsageError};

/// Parses the command line, wires config, telemetry and the HTTP client,
/// runs one command and prints its result as JSON on stdout.
pub async fn run() -> Result<(), BootstrapError> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&argv)?;
    if command == Command::Help {
        print!("{}", usage());
        return Ok(());
    }

    let config = ClientConfig::load_from_env()?;
    let telemetry_config = TelemetryConfig::from_env("LISTING_DASH");
    let telemetry = init_telemetry(&telemetry_config)?;

    let client = Arc::new(HttpClient::new(&config)?);
    let cache = UserInfoCache::new(config.user_cache_ttl());
    debug!(base_url = %client.base_url(), ?command, "running command");

    let output = execute(command, client, cache).await;
    debug!(metrics = %telemetry.render_metrics(), "request counters");
    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}

async fn execute(
    command: Command,
    client: Arc<HttpClient>,
    cache: UserInfoCache,
) -> Result<Value, BootstrapError> {
    let output = match command {
        Command::Help => Value::String(usage()),
        Command::Whoami => encode(client.me().await?)?,
        Command::LoginUrl { redirect } => Value::String(client.login_url(&redirect)?),
        Command::Logout => {
            client.logout().await?;
            json!({ "logged_out": true })
        }
        Command::Dashboard { bot } => {
            encode(BotOverview::new(client, cache, bot).load().await?)?
        }
        Command::Listings { bot } => {
            let view = BotListings::new(client, cache, bot);
            view.refresh().await?;
            listings_output(&view)
        }
        Command::Unlist { bot, message } => {
            let view = BotListings::new(client, cache, bot);
            let unlisted = view.unlist(&message).await?;
            json!({ "unlisted": unlisted, "remaining": view.listings().total() })
        }
        Command::Config { bot } => {
            let editor = ConfigEditor::new(client, bot);
            editor.load().await?;
            encode(editor.configuration())?
        }
        Command::ConfigSet { bot, key, value } => {
            let editor = ConfigEditor::new(client, bot);
            editor.load().await?;
            if !editor.stage(&key, value) {
                return Err(UsageError::UnknownOption { key }.into());
            }
            let applied = editor.save().await?;
            json!({
                "saved": applied,
                "option": editor.configuration().get(&key),
                "display_name": editor.display_name(&key),
            })
        }
        Command::AuthActions {
            bot,
            show_resolved,
            action_type,
        } => {
            let queue = AuthQueue::new(client, cache, bot);
            queue.refresh().await?;
            queue.set_filter(AuthActionFilter {
                show_resolved,
                action_type,
            });
            let actions = queue.visible();
            let users: BTreeMap<&str, String> = actions
                .iter()
                .map(|action| {
                    let label = queue
                        .user(&action.user_id)
                        .map(|user| user.label(&action.user_id).to_string())
                        .unwrap_or_else(|| action.user_id.clone());
                    (action.user_id.as_str(), label)
                })
                .collect();
            json!({ "actions": actions, "users": users })
        }
        Command::Verify { bot, action_id } => {
            let queue = AuthQueue::new(client, cache, bot);
            queue.verify(&action_id).await?;
            let resolved = queue
                .actions()
                .iter()
                .any(|action| action.action_id == action_id && action.resolved);
            json!({ "action_id": action_id, "verified": true, "resolved": resolved })
        }
        Command::SellerListings => {
            encode(SellerDashboard::new(client.clone(), client).refresh().await?)?
        }
        Command::SellerConfig => {
            let dashboard = SellerDashboard::new(client.clone(), client);
            encode(dashboard.load_configuration(&StdinPrompt).await?)?
        }
        Command::SellerList { form } => {
            // Validate before the payment methods fetch so a bad form
            // never touches the network.
            form.build(None).map_err(ClientError::from)?;
            let dashboard = SellerDashboard::new(client.clone(), client);
            dashboard.refresh().await?;
            dashboard.submit_listing(&form).await?
        }
        Command::SellerSync => {
            let dashboard = SellerDashboard::new(client.clone(), client);
            dashboard.refresh().await?;
            encode(dashboard.sync().await?)?
        }
        Command::Shop { bot } => {
            let view = ShopView::new(client, bot);
            view.load().await?;
            let categories: BTreeMap<&str, usize> = ShopCategory::iter()
                .map(|category| (category.title(), view.items(category).len()))
                .collect();
            json!({
                "categories": categories,
                "items": view.items(ShopCategory::All),
                "sellers": view.sellers(),
            })
        }
        Command::Vouches { bot, seller } => {
            let view = ShopView::new(client, bot);
            view.load().await?;
            encode(view.vouches(seller.as_deref()))?
        }
        Command::Ticket { bot } => Value::String(ShopView::new(client, bot).open_ticket().await?),
        Command::ResolveBot { host, path } => {
            encode(resolve_bot_name(client.as_ref(), &host, &path).await)?
        }
    };
    Ok(output)
}

fn encode<T: Serialize>(value: T) -> Result<Value, BootstrapError> {
    Ok(serde_json::to_value(value)?)
}

fn listings_output(view: &BotListings) -> Value {
    let listings = view.listings();
    let sellers: BTreeMap<String, String> = listings
        .iter_all()
        .filter_map(|(_, item)| item.listed_by.clone())
        .map(|id| {
            let label = view
                .seller(&id)
                .map(|user| user.label(&id).to_string())
                .unwrap_or_else(|| id.clone());
            (id, label)
        })
        .collect();
    json!({ "listings": listings, "sellers": sellers })
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
