//! reqwest implementation of the API traits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use listing_dash_domain::{
    AuthAction, AuthorizedBot, AuthorizedUser, BotNameResponse, ChannelsResponse, ClientConfig,
    ConfigResponse, ConfigSaveResponse, ConfigUpdates, DashboardSummary, Envelope, GuildChannels,
    ListRequest, ListedItemsResponse, ListingSet, MessageRef, MinecraftProfile, Role,
    RolesResponse,
    SellerConfiguration, SellerConfigurationWire, SellerListings, ServerResults, SessionInfo,
    ShopInfo, TicketResponse, UserInfo, UsersInfoResponse, VerifyRequest, VerifyResponse,
};
use metrics::counter;
use reqwest::{
    header::{COOKIE, HOST},
    Method, RequestBuilder, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    api::{BotApi, ProfileLookup, SellerApi, SessionApi, ShopApi},
    ClientError,
};

/// HTTP client for the listing-bot service. Cheap to clone; clones share
/// the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    profile_lookup_url: Url,
    session_cookie: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = parse_base(config.base_url())?;
        let profile_lookup_url = parse_base(config.profile_lookup_url())?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            profile_lookup_url,
            session_cookie: config.session_cookie().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        join_segments(&self.base_url, segments)
    }

    fn bot_url(&self, bot: &str, rest: &[&str]) -> Result<Url, ClientError> {
        let mut segments = vec!["api", "bot", bot];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    /// Sends `builder` and returns the body of a 2xx response. Every call
    /// is counted under `client_requests_total{endpoint,result}`.
    async fn send(&self, endpoint: &'static str, builder: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let outcome = execute(endpoint, builder).await;
        let result = match &outcome {
            Ok(_) => "ok",
            Err(ClientError::Unauthorized) => "unauthorized",
            Err(ClientError::Forbidden) => "forbidden",
            Err(ClientError::Status { .. }) => "status",
            Err(_) => "error",
        };
        counter!("client_requests_total", "endpoint" => endpoint, "result" => result).increment(1);
        outcome
    }

    async fn get_json<T>(&self, endpoint: &'static str, url: Url) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let body = self.send(endpoint, self.request(Method::GET, url)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_json<B, T>(&self, endpoint: &'static str, url: Url, payload: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, url).json(payload);
        let body = self.send(endpoint, builder).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST whose response body is informational only.
    async fn post_loose<B>(&self, endpoint: &'static str, url: Url, payload: &B) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let builder = self.request(Method::POST, url).json(payload);
        let body = self.send(endpoint, builder).await?;
        Ok(serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|err| ClientError::InvalidUrl(format!("{raw}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn execute(endpoint: &'static str, builder: RequestBuilder) -> Result<Vec<u8>, ClientError> {
    let response = builder.send().await.map_err(|err| {
        warn!(endpoint, error = %err, "request failed before a response arrived");
        ClientError::from(err)
    })?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();
    debug!(endpoint, status = status.as_u16(), bytes = body.len(), "response received");

    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
        status if status.is_success() => Ok(body),
        status => Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(&body, status),
        }),
    }
}

/// Message of an error body: its `error` or `detail` field when present.
fn error_message(body: &[u8], status: StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["error", "detail"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}

fn rejected(error: Option<String>, fallback: &str) -> ClientError {
    ClientError::Rejected(
        error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    )
}

/// Envelope with an explicit `success` flag; anything else is rejected.
fn successful_data<T: Default>(envelope: Envelope<T>, fallback: &str) -> Result<T, ClientError> {
    if envelope.success {
        Ok(envelope.data.unwrap_or_default())
    } else {
        Err(rejected(envelope.error, fallback))
    }
}

#[async_trait]
impl SessionApi for HttpClient {
    async fn me(&self) -> Result<SessionInfo, ClientError> {
        let url = self.url(&["auth", "me"])?;
        self.get_json("auth_me", url).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let url = self.url(&["auth", "logout"])?;
        self.send("auth_logout", self.request(Method::GET, url))
            .await
            .map(|_| ())
    }

    fn login_url(&self, redirect: &str) -> Result<String, ClientError> {
        let mut url = self.url(&["auth", "discord", "login"])?;
        url.query_pairs_mut().append_pair("redirect_url", redirect);
        Ok(url.to_string())
    }
}

#[async_trait]
impl BotApi for HttpClient {
    async fn dashboard(&self, bot: &str) -> Result<DashboardSummary, ClientError> {
        let url = self.url(&["dash", bot])?;
        self.get_json("dashboard", url).await
    }

    async fn authorized_bots(&self, bot: &str) -> Result<Vec<AuthorizedBot>, ClientError> {
        let url = self.bot_url(bot, &["auth", "bots"])?;
        let envelope = self.get_json("auth_bots", url).await?;
        successful_data(envelope, "Failed to fetch authorized bots")
    }

    async fn authorized_users(&self, bot: &str) -> Result<Vec<AuthorizedUser>, ClientError> {
        let url = self.bot_url(bot, &["auth", "users"])?;
        let envelope = self.get_json("auth_users", url).await?;
        successful_data(envelope, "Failed to fetch authorized users")
    }

    async fn config(&self, bot: &str) -> Result<ConfigResponse, ClientError> {
        let url = self.bot_url(bot, &["config"])?;
        let response: ConfigResponse = self.get_json("config", url).await?;
        if response.success {
            Ok(response)
        } else {
            Err(rejected(response.error, "Failed to load configuration"))
        }
    }

    async fn save_config(
        &self,
        bot: &str,
        updates: &ConfigUpdates,
    ) -> Result<ConfigSaveResponse, ClientError> {
        let url = self.bot_url(bot, &["config"])?;
        self.post_json("config_save", url, updates).await
    }

    async fn channels(&self, bot: &str) -> Result<GuildChannels, ClientError> {
        let url = self.bot_url(bot, &["channels"])?;
        let response: ChannelsResponse = self.get_json("channels", url).await?;
        if response.success {
            Ok(response.data)
        } else {
            Err(rejected(response.error, "Failed to load channels"))
        }
    }

    async fn roles(&self, bot: &str) -> Result<Vec<Role>, ClientError> {
        let url = self.bot_url(bot, &["roles"])?;
        let response: RolesResponse = self.get_json("roles", url).await?;
        if response.success {
            Ok(response.roles)
        } else {
            Err(rejected(response.error, "Failed to load roles"))
        }
    }

    async fn auth_actions(&self, bot: &str) -> Result<Vec<AuthAction>, ClientError> {
        let url = self.bot_url(bot, &["auth", "actions"])?;
        // The queue endpoint omits `success`; only an explicit error rejects.
        let envelope: Envelope<Vec<AuthAction>> = self.get_json("auth_actions", url).await?;
        match envelope.error {
            Some(error) if !envelope.success => Err(ClientError::Rejected(error)),
            _ => Ok(envelope.data.unwrap_or_default()),
        }
    }

    async fn verify_user(
        &self,
        bot: &str,
        action_id: &str,
    ) -> Result<VerifyResponse, ClientError> {
        let url = self.bot_url(bot, &["verify", "user"])?;
        let payload = VerifyRequest {
            action_id: action_id.to_string(),
        };
        self.post_json("verify_user", url, &payload).await
    }

    async fn listed_items(&self, bot: &str) -> Result<ListingSet, ClientError> {
        let url = self.bot_url(bot, &["listed", "items"])?;
        let response: ListedItemsResponse = self.get_json("listed_items", url).await?;
        if response.success {
            Ok(response.data)
        } else {
            Err(rejected(response.error, "Failed to load listings data"))
        }
    }

    async fn unlist_item(&self, bot: &str, message: &MessageRef) -> Result<(), ClientError> {
        let url = self.bot_url(bot, &["unlist", "item"])?;
        self.post_loose("unlist_item", url, message).await.map(|_| ())
    }

    async fn users_info(
        &self,
        bot: &str,
        ids: &[String],
    ) -> Result<BTreeMap<String, UserInfo>, ClientError> {
        let url = self.bot_url(bot, &["users", "info"])?;
        let response: UsersInfoResponse = self.post_json("users_info", url, ids).await?;
        match response {
            UsersInfoResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data.into_map()),
            UsersInfoResponse { success: true, .. } => Ok(BTreeMap::new()),
            UsersInfoResponse { error, .. } => Err(rejected(error, "Failed to fetch users info")),
        }
    }
}

#[async_trait]
impl SellerApi for HttpClient {
    async fn accounts(&self) -> Result<ServerResults<SellerListings>, ClientError> {
        let url = self.url(&["api", "seller", "accounts"])?;
        self.get_json("seller_accounts", url).await
    }

    async fn configuration(&self) -> Result<ServerResults<SellerConfigurationWire>, ClientError> {
        let url = self.url(&["api", "seller", "configuration"])?;
        self.get_json("seller_configuration", url).await
    }

    async fn save_configuration(
        &self,
        configuration: &SellerConfiguration,
    ) -> Result<Value, ClientError> {
        let url = self.url(&["api", "seller", "configuration"])?;
        self.post_loose("seller_configuration_save", url, configuration)
            .await
    }

    async fn list_item(&self, request: &ListRequest) -> Result<Value, ClientError> {
        let url = self.url(&["api", "seller", "list"])?;
        self.post_loose("seller_list", url, request).await
    }
}

#[async_trait]
impl ShopApi for HttpClient {
    async fn shop_info(&self, bot: &str) -> Result<ShopInfo, ClientError> {
        let url = self.bot_url(bot, &["shop", "info"])?;
        let body = self
            .send("shop_info", self.http.request(Method::GET, url))
            .await?;
        let raw: Value = serde_json::from_slice(&body)?;
        if raw.get("success").and_then(Value::as_bool) == Some(false) {
            let error = raw.get("error").and_then(Value::as_str).map(str::to_string);
            return Err(rejected(error, "Failed to load shop data"));
        }
        Ok(serde_json::from_value(raw)?)
    }

    async fn open_ticket(&self, bot: &str) -> Result<TicketResponse, ClientError> {
        let url = self.url(&["api", bot, "initialize", "website", "ticket", "open"])?;
        self.get_json("ticket_open", url).await
    }

    async fn custom_bot_name(&self, host: &str) -> Result<Option<String>, ClientError> {
        let url = self.url(&["custom", "bot", "name"])?;
        let builder = self.http.request(Method::GET, url).header(HOST, host);
        let body = self.send("custom_bot_name", builder).await?;
        let response: BotNameResponse = serde_json::from_slice(&body)?;
        Ok(response.name.filter(|name| !name.trim().is_empty()))
    }
}

#[async_trait]
impl ProfileLookup for HttpClient {
    async fn profile(&self, username: &str) -> Result<Option<MinecraftProfile>, ClientError> {
        let url = join_segments(&self.profile_lookup_url, &[username])?;
        // Third-party service: the session cookie stays with the listing bot.
        let builder = self.http.request(Method::GET, url);
        match self.send("profile_lookup", builder).await {
            Ok(body) => {
                let profile: MinecraftProfile = serde_json::from_slice(&body)?;
                Ok(Some(profile).filter(MinecraftProfile::exists))
            }
            Err(ClientError::Status { status, .. }) => {
                debug!(username, status, "profile lookup found no account");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
