use std::sync::{Arc, Mutex};

use futures_util::join;
use listing_dash_domain::{
    aggregate_listings, merge_seller_configuration, payment_methods_string, AggregatedListings,
    CorrectionPrompt, ListingForm, SellerConfiguration, SellerConfigurationWire, SellerListings,
    ServerResults, SubmissionError,
};
use serde_json::Value;
use tracing::{info, warn};

use super::{error_text, lock};
use crate::{
    api::{ProfileLookup, SellerApi},
    sync::{SyncDispatcher, SyncReport},
    ClientError, Scope,
};

#[derive(Default)]
struct SellerState {
    accounts: ServerResults<SellerListings>,
    aggregated: AggregatedListings,
    configuration: ServerResults<SellerConfigurationWire>,
    form: SellerConfiguration,
    error: Option<String>,
}

/// Seller pages: listings across every server, the shared configuration
/// form, new listings and re-syncs.
pub struct SellerDashboard {
    api: Arc<dyn SellerApi>,
    profiles: Arc<dyn ProfileLookup>,
    scope: Scope,
    state: Mutex<SellerState>,
}

impl SellerDashboard {
    pub fn new(api: Arc<dyn SellerApi>, profiles: Arc<dyn ProfileLookup>) -> Self {
        Self {
            api,
            profiles,
            scope: Scope::new(),
            state: Mutex::new(SellerState::default()),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetches per-server listings and configuration together and merges
    /// the listings. Only the listings are required: a failed
    /// configuration fetch is recorded and leaves the payment methods out
    /// of later requests.
    pub async fn refresh(&self) -> Result<AggregatedListings, ClientError> {
        let (accounts, configuration) = self
            .scope
            .run(async {
                Ok::<_, ClientError>(join!(self.api.accounts(), self.api.configuration()))
            })
            .await?;
        let accounts = accounts.map_err(|err| self.record(err))?;
        let configuration = configuration.unwrap_or_else(|err| {
            warn!(error = %err, "seller configuration unavailable");
            self.record(err);
            ServerResults::default()
        });

        let aggregated = aggregate_listings(&accounts);
        info!(
            servers = accounts.len(),
            items = aggregated.total(),
            duplicates = aggregated.duplicates,
            "seller listings loaded"
        );
        let mut state = lock(&self.state);
        state.accounts = accounts;
        state.aggregated = aggregated.clone();
        state.configuration = configuration;
        Ok(aggregated)
    }

    pub fn aggregated(&self) -> AggregatedListings {
        lock(&self.state).aggregated.clone()
    }

    /// Fetches the configuration and builds the editable form, asking
    /// `prompt` what to do about unsupported payment methods.
    pub async fn load_configuration(
        &self,
        prompt: &dyn CorrectionPrompt,
    ) -> Result<SellerConfiguration, ClientError> {
        let configuration = self
            .scope
            .run(self.api.configuration())
            .await
            .map_err(|err| self.record(err))?;

        let merge = merge_seller_configuration(&configuration);
        lock(&self.state).configuration = configuration;
        let form = merge.resolve_with(prompt).await;
        lock(&self.state).form = form.clone();
        Ok(form)
    }

    pub fn form(&self) -> SellerConfiguration {
        lock(&self.state).form.clone()
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut SellerConfiguration)) {
        edit(&mut lock(&self.state).form);
    }

    /// Posts the whole form; every server receives the same configuration.
    pub async fn save_configuration(&self) -> Result<Value, ClientError> {
        let form = self.form();
        self.scope
            .run(self.api.save_configuration(&form))
            .await
            .map_err(|err| self.record(err))
    }

    /// Validates and lists one item, then refetches. The form is checked
    /// locally, then the username must resolve to an existing account;
    /// failures of either never reach the list endpoint. Once the server
    /// accepted the item the call succeeds; a failed refetch is only
    /// recorded.
    pub async fn submit_listing(&self, form: &ListingForm) -> Result<Value, ClientError> {
        let payment_methods = payment_methods_string(&lock(&self.state).configuration);
        let request = form
            .build(payment_methods.as_deref())
            .map_err(|err| self.record(err.into()))?;

        let profile = self
            .scope
            .run(self.profiles.profile(&request.item.username))
            .await
            .map_err(|err| self.record(err))?;
        if profile.is_none() {
            let unknown = SubmissionError::UnknownUsername(request.item.username.clone());
            return Err(self.record(unknown.into()));
        }

        let reply = self
            .scope
            .run(self.api.list_item(&request))
            .await
            .map_err(|err| self.record(err))?;
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "listing submitted but refetch failed");
        }
        Ok(reply)
    }

    /// Re-lists everything from the last refresh.
    pub async fn sync(&self) -> Result<SyncReport, ClientError> {
        let (accounts, configuration) = {
            let state = lock(&self.state);
            (state.accounts.clone(), state.configuration.clone())
        };
        let dispatcher = SyncDispatcher::new(self.api.clone());
        self.scope
            .run(async { Ok(dispatcher.sync_all(&accounts, &configuration).await) })
            .await
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

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use listing_dash_domain::{
        CorrectionDecision, FixedDecision, ListRequest, ListingKind, MinecraftProfile,
    };
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockSeller {
        fetches: AtomicUsize,
        /// Account fetches after this many fail with a 502.
        accounts_up_to: Option<usize>,
        configuration_down: bool,
        listed: Mutex<Vec<ListRequest>>,
        lookups: Mutex<Vec<String>>,
        saved: Mutex<Vec<SellerConfiguration>>,
    }

    #[async_trait]
    impl SellerApi for MockSeller {
        async fn accounts(&self) -> Result<ServerResults<SellerListings>, ClientError> {
            let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.accounts_up_to.is_some_and(|limit| fetch >= limit) {
                return Err(ClientError::Status {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            Ok(serde_json::from_value(json!({
                "servers": {
                    "east": {"success": true, "data": {"accounts": [
                        {"uuid": "a", "number": 1, "username": "Steve", "price": 10}
                    ]}},
                    "west": {"success": true, "data": {"accounts": [
                        {"uuid": "a", "number": 1, "username": "Steve", "price": 12}
                    ]}}
                }
            }))?)
        }

        async fn configuration(
            &self,
        ) -> Result<ServerResults<SellerConfigurationWire>, ClientError> {
            if self.configuration_down {
                return Err(ClientError::Status {
                    status: 500,
                    message: "config down".into(),
                });
            }
            Ok(serde_json::from_value(json!({
                "servers": {"east": {"success": true, "data": {
                    "payment_methods": "PayPal/robux",
                    "sellauth": {"store_id": "s-1"}
                }}}
            }))?)
        }

        async fn save_configuration(
            &self,
            configuration: &SellerConfiguration,
        ) -> Result<Value, ClientError> {
            self.saved.lock().unwrap().push(configuration.clone());
            Ok(json!({"success": true}))
        }

        async fn list_item(&self, request: &ListRequest) -> Result<Value, ClientError> {
            self.listed.lock().unwrap().push(request.clone());
            Ok(json!({"success": true}))
        }
    }

    #[async_trait]
    impl ProfileLookup for MockSeller {
        async fn profile(&self, username: &str) -> Result<Option<MinecraftProfile>, ClientError> {
            self.lookups.lock().unwrap().push(username.to_string());
            Ok((username != "Nobody_Here").then(|| MinecraftProfile {
                id: format!("{}-uuid", username.to_lowercase()),
                name: username.to_string(),
            }))
        }
    }

    fn seller_dashboard(api: &Arc<MockSeller>) -> SellerDashboard {
        SellerDashboard::new(api.clone(), api.clone())
    }

    #[tokio::test]
    async fn refresh_merges_duplicate_listings() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);

        let aggregated = dashboard.refresh().await.unwrap();

        assert_eq!(aggregated.accounts.len(), 1);
        assert_eq!(aggregated.accounts[0].server, "east");
        assert_eq!(aggregated.accounts[0].item.price, Some(10));
        assert_eq!(aggregated.duplicates, 1);
    }

    #[tokio::test]
    async fn configuration_form_follows_the_decision() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);

        let form = dashboard
            .load_configuration(&FixedDecision(CorrectionDecision::AcceptSuggested))
            .await
            .unwrap();
        assert_eq!(form.payment_methods, vec!["paypal"]);
        assert_eq!(form.sellauth.store_id, "s-1");

        dashboard.update_form(|form| form.toggle_payment_method("zelle"));
        dashboard.save_configuration().await.unwrap();
        assert_eq!(
            api.saved.lock().unwrap()[0].payment_methods,
            vec!["paypal", "zelle"]
        );
    }

    #[tokio::test]
    async fn invalid_alt_is_rejected_before_sending() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);
        let form = ListingForm {
            kind: ListingKind::Alt,
            username: "Notch".into(),
            price: "5".into(),
            farming: false,
            mining: false,
            ..ListingForm::default()
        };

        let result = dashboard.submit_listing(&form).await;

        assert!(matches!(
            result,
            Err(ClientError::Submission(SubmissionError::AltWithoutActivity))
        ));
        assert!(api.listed.lock().unwrap().is_empty());
        assert!(api.lookups.lock().unwrap().is_empty());
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
        assert!(dashboard.take_error().is_some());
    }

    #[tokio::test]
    async fn unknown_username_is_not_listed() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);
        let form = ListingForm {
            username: "Nobody_Here".into(),
            price: "5".into(),
            ..ListingForm::default()
        };

        let result = dashboard.submit_listing(&form).await;

        assert!(matches!(
            result,
            Err(ClientError::Submission(SubmissionError::UnknownUsername(ref name))) if name == "Nobody_Here"
        ));
        assert_eq!(*api.lookups.lock().unwrap(), vec!["Nobody_Here"]);
        assert!(api.listed.lock().unwrap().is_empty());
        assert!(dashboard.take_error().unwrap().contains("Nobody_Here"));
    }

    #[tokio::test]
    async fn submitted_listing_carries_payment_methods_and_refetches() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);
        dashboard.refresh().await.unwrap();
        let form = ListingForm {
            username: "Notch".into(),
            price: "15".into(),
            ..ListingForm::default()
        };

        dashboard.submit_listing(&form).await.unwrap();

        let listed = api.listed.lock().unwrap();
        assert_eq!(listed[0].item.payment_methods.as_deref(), Some("PayPal/robux"));
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sync_relists_every_server_item() {
        let api = Arc::new(MockSeller::default());
        let dashboard = seller_dashboard(&api);
        dashboard.refresh().await.unwrap();

        let report = dashboard.sync().await.unwrap();

        assert_eq!(
            report,
            SyncReport {
                successful: 2,
                total: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn configuration_failure_still_loads_listings() {
        let api = Arc::new(MockSeller {
            configuration_down: true,
            ..MockSeller::default()
        });
        let dashboard = seller_dashboard(&api);

        let aggregated = dashboard.refresh().await.unwrap();
        assert_eq!(aggregated.total(), 1);
        assert!(dashboard.take_error().unwrap().contains("config down"));

        let report = dashboard.sync().await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 2);
        let listed = api.listed.lock().unwrap();
        assert!(listed.iter().all(|request| request.item.payment_methods.is_none()));
    }

    #[tokio::test]
    async fn accepted_listing_survives_a_failed_refetch() {
        let api = Arc::new(MockSeller {
            accounts_up_to: Some(1),
            ..MockSeller::default()
        });
        let dashboard = seller_dashboard(&api);
        dashboard.refresh().await.unwrap();
        let form = ListingForm {
            username: "Notch".into(),
            price: "15".into(),
            ..ListingForm::default()
        };

        let reply = dashboard.submit_listing(&form).await.unwrap();

        assert_eq!(reply, json!({"success": true}));
        assert_eq!(api.listed.lock().unwrap().len(), 1);
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
        assert!(dashboard.take_error().unwrap().contains("bad gateway"));
        assert_eq!(dashboard.aggregated().total(), 1);
    }
}
