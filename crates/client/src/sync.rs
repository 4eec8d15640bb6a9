//! Re-listing every item a seller has on any server.

use std::sync::Arc;

use futures_util::future::join_all;
use listing_dash_domain::{
    payment_methods_string, sync_request, ListRequest, SellerConfigurationWire, SellerListings,
    ServerResults,
};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::SellerApi;

/// Outcome of a sync; `successful + failed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub successful: usize,
    pub total: usize,
    pub failed: usize,
}

/// One list request per item of every successful server, accounts first,
/// then profiles, then alts.
pub fn sync_requests(
    accounts: &ServerResults<SellerListings>,
    payment_methods: Option<&str>,
) -> Vec<ListRequest> {
    accounts
        .successful()
        .flat_map(|(_, listings)| listings.iter_all())
        .map(|(kind, item)| sync_request(kind, item, payment_methods))
        .collect()
}

pub struct SyncDispatcher {
    api: Arc<dyn SellerApi>,
}

impl SyncDispatcher {
    pub fn new(api: Arc<dyn SellerApi>) -> Self {
        Self { api }
    }

    pub async fn sync_all(
        &self,
        accounts: &ServerResults<SellerListings>,
        configuration: &ServerResults<SellerConfigurationWire>,
    ) -> SyncReport {
        let payment_methods = payment_methods_string(configuration);
        let requests = sync_requests(accounts, payment_methods.as_deref());
        self.dispatch(&requests).await
    }

    /// Sends every request concurrently and waits for all of them. Failures
    /// are counted, never retried.
    pub async fn dispatch(&self, requests: &[ListRequest]) -> SyncReport {
        let outcomes = join_all(requests.iter().map(|request| self.api.list_item(request))).await;

        let mut report = SyncReport {
            total: requests.len(),
            ..SyncReport::default()
        };
        for (request, outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(_) => {
                    report.successful += 1;
                    counter!("seller_sync_items_total", "result" => "ok").increment(1);
                }
                Err(err) => {
                    report.failed += 1;
                    counter!("seller_sync_items_total", "result" => "error").increment(1);
                    warn!(
                        username = %request.item.username,
                        kind = %request.kind,
                        error = %err,
                        "sync request failed"
                    );
                }
            }
        }

        info!(
            successful = report.successful,
            failed = report.failed,
            total = report.total,
            "seller sync finished"
        );
        report
    }
}
