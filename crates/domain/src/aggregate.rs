//! Collapses the per-server seller listings into one view.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::model::{ListingItem, ListingKey, ListingKind, SellerListings, ServerResults};

/// A listing together with the server that reported it first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerListing {
    pub server: String,
    #[serde(flatten)]
    pub item: ListingItem,
}

/// De-duplicated listings across every successful server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedListings {
    pub accounts: Vec<ServerListing>,
    pub profiles: Vec<ServerListing>,
    pub alts: Vec<ServerListing>,
    /// Duplicates dropped because a listing with the same key was already
    /// seen, whether or not their fields agreed.
    pub duplicates: usize,
    /// Distinct `listed_by` IDs, handy for prefetching user info.
    pub listed_by: BTreeSet<String>,
}

impl AggregatedListings {
    pub fn collection(&self, kind: ListingKind) -> &[ServerListing] {
        match kind {
            ListingKind::Account => &self.accounts,
            ListingKind::Profile => &self.profiles,
            ListingKind::Alt => &self.alts,
        }
    }

    pub fn total(&self) -> usize {
        self.accounts.len() + self.profiles.len() + self.alts.len()
    }
}

/// First occurrence of a [`ListingKey`] wins, following the server order
/// of the response. Failed servers and successes without data are
/// skipped.
pub fn aggregate_listings(results: &ServerResults<SellerListings>) -> AggregatedListings {
    let mut aggregated = AggregatedListings::default();
    let mut seen: HashSet<ListingKey> = HashSet::new();

    for (server, listings) in results.successful() {
        for kind in [ListingKind::Account, ListingKind::Profile, ListingKind::Alt] {
            for item in listings.collection(kind) {
                if let Some(user) = item.listed_by.as_ref() {
                    aggregated.listed_by.insert(user.clone());
                }

                let key = item.key(kind);
                if !seen.insert(key) {
                    aggregated.duplicates += 1;
                    tracing::debug!(
                        server,
                        kind = kind.as_ref(),
                        uuid = %item.uuid,
                        "dropping duplicate listing"
                    );
                    continue;
                }

                let entry = ServerListing {
                    server: server.to_string(),
                    item: item.clone(),
                };
                match kind {
                    ListingKind::Account => aggregated.accounts.push(entry),
                    ListingKind::Profile => aggregated.profiles.push(entry),
                    ListingKind::Alt => aggregated.alts.push(entry),
                }
            }
        }
    }

    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results(raw: serde_json::Value) -> ServerResults<SellerListings> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn same_uuid_number_profile_survives_once() {
        let aggregated = aggregate_listings(&results(json!({
            "servers": {
                "alpha": {"success": true, "data": {
                    "accounts": [{"uuid": "u1", "number": 1, "price": 10, "listed_by": "7"}]
                }},
                "beta": {"success": true, "data": {
                    "accounts": [{"uuid": "u1", "number": 1, "price": 99, "listed_by": "8"}]
                }}
            }
        })));

        assert_eq!(aggregated.accounts.len(), 1);
        assert_eq!(aggregated.accounts[0].server, "alpha");
        assert_eq!(aggregated.accounts[0].item.price, Some(10));
        assert_eq!(aggregated.duplicates, 1);
        assert_eq!(aggregated.listed_by.len(), 2);
    }

    #[test]
    fn failed_servers_are_skipped() {
        let aggregated = aggregate_listings(&results(json!({
            "servers": {
                "down": {"success": false, "error": "timeout", "data": {
                    "alts": [{"uuid": "a", "number": 2}]
                }},
                "empty": {"success": true}
            }
        })));
        assert_eq!(aggregated.total(), 0);
    }

    #[test]
    fn collections_deduplicate_independently() {
        let aggregated = aggregate_listings(&results(json!({
            "servers": {
                "alpha": {"success": true, "data": {
                    "accounts": [{"uuid": "u1", "number": 1}],
                    "profiles": [{"uuid": "u1", "number": 1}],
                    "alts": [
                        {"uuid": "u1", "number": 1, "farming": true, "mining": false},
                        {"uuid": "u1", "number": 1, "farming": false, "mining": true}
                    ]
                }}
            }
        })));
        assert_eq!(aggregated.accounts.len(), 1);
        assert_eq!(aggregated.profiles.len(), 1);
        assert_eq!(aggregated.alts.len(), 2);
        assert_eq!(aggregated.duplicates, 0);
    }

    #[test]
    fn distinct_profiles_are_kept() {
        let aggregated = aggregate_listings(&results(json!({
            "servers": {
                "alpha": {"success": true, "data": {
                    "profiles": [
                        {"uuid": "u1", "number": 1, "profile": "Apple"},
                        {"uuid": "u1", "number": 1, "profile": "Banana"},
                        {"uuid": "u1", "number": 1, "profile": "Apple"}
                    ]
                }}
            }
        })));
        assert_eq!(aggregated.profiles.len(), 2);
        assert_eq!(aggregated.duplicates, 1);
    }
}
