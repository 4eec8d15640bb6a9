use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{lenient, listing::ListingSet};

/// SellAuth store integration of a seller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellauthSettings {
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub store_id: String,
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub store_name: String,
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient::required_id")]
    pub variant_id: String,
}

/// Partial sellauth block as stored on one server; absent fields leave the
/// defaults untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellauthPatch {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub store_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub store_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub variant_id: Option<String>,
}

impl SellauthSettings {
    pub fn apply(&mut self, patch: &SellauthPatch) {
        overwrite(&mut self.store_id, &patch.store_id);
        overwrite(&mut self.store_name, &patch.store_name);
        overwrite(&mut self.product_id, &patch.product_id);
        overwrite(&mut self.variant_id, &patch.variant_id);
    }
}

/// Payout details shown to buyers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub paypal_email: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub bitcoin_address: String,
    #[serde(default)]
    pub ethereum_address: String,
    #[serde(default)]
    pub litecoin_address: String,
    /// Fields this client does not model, kept so a save does not drop them.
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetailsPatch {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub paypal_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub business_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub bitcoin_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub ethereum_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub litecoin_address: Option<String>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl PaymentDetails {
    pub fn apply(&mut self, patch: &PaymentDetailsPatch) {
        overwrite(&mut self.paypal_email, &patch.paypal_email);
        overwrite(&mut self.business_name, &patch.business_name);
        overwrite(&mut self.currency, &patch.currency);
        overwrite(&mut self.bitcoin_address, &patch.bitcoin_address);
        overwrite(&mut self.ethereum_address, &patch.ethereum_address);
        overwrite(&mut self.litecoin_address, &patch.litecoin_address);
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

fn overwrite(slot: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        slot.clone_from(value);
    }
}

/// `payment_methods` as stored server side: either a list or a single
/// `/`- or `,`-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentMethodsWire {
    List(Vec<String>),
    Joined(String),
}

impl PaymentMethodsWire {
    /// Splits into individual trimmed method names, dropping empties.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            PaymentMethodsWire::List(items) => items.iter().map(String::as_str).collect(),
            PaymentMethodsWire::Joined(joined) => joined.split(['/', ',']).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Single-string form attached to listing payloads.
    pub fn joined(&self) -> String {
        match self {
            PaymentMethodsWire::List(items) => items.join("/"),
            PaymentMethodsWire::Joined(joined) => joined.clone(),
        }
    }
}

/// One server's seller configuration as returned by
/// `GET /api/seller/configuration`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerConfigurationWire {
    #[serde(default)]
    pub sellauth: Option<SellauthPatch>,
    #[serde(default)]
    pub payment_methods: Option<PaymentMethodsWire>,
    #[serde(default)]
    pub payment_details: Option<PaymentDetailsPatch>,
}

/// The merged, editable seller configuration; also the body posted back on
/// save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerConfiguration {
    #[serde(default)]
    pub sellauth: SellauthSettings,
    #[serde(default)]
    pub payment_methods: Vec<String>,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

impl SellerConfiguration {
    /// Adds `method` when absent, removes it when present.
    pub fn toggle_payment_method(&mut self, method: &str) {
        if let Some(position) = self.payment_methods.iter().position(|m| m == method) {
            self.payment_methods.remove(position);
        } else {
            self.payment_methods.push(method.to_string());
        }
    }
}

/// One server's listings as returned by `GET /api/seller/accounts`.
pub type SellerListings = ListingSet;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joined_methods_split_on_both_separators() {
        let wire: PaymentMethodsWire = serde_json::from_value(json!(" paypal / bitcoin,, Venmo ")).unwrap();
        assert_eq!(wire.normalize(), vec!["paypal", "bitcoin", "Venmo"]);
    }

    #[test]
    fn list_methods_join_with_slash() {
        let wire = PaymentMethodsWire::List(vec!["paypal".into(), "usdt".into()]);
        assert_eq!(wire.joined(), "paypal/usdt");
    }

    #[test]
    fn patches_only_overwrite_present_fields() {
        let mut settings = SellauthSettings {
            store_name: "Kept".into(),
            ..SellauthSettings::default()
        };
        let patch: SellauthPatch =
            serde_json::from_value(json!({"store_id": 991, "store_name": null})).unwrap();
        settings.apply(&patch);
        assert_eq!(settings.store_id, "991");
        assert_eq!(settings.store_name, "Kept");
    }

    #[test]
    fn payment_details_keep_unknown_fields() {
        let mut details = PaymentDetails::default();
        let patch: PaymentDetailsPatch = serde_json::from_value(json!({
            "currency": "USD",
            "solana_address": "So1"
        }))
        .unwrap();
        details.apply(&patch);
        assert_eq!(details.currency, "USD");
        let encoded = serde_json::to_value(&details).unwrap();
        assert_eq!(encoded["solana_address"], "So1");
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut config = SellerConfiguration::default();
        config.toggle_payment_method("zelle");
        assert_eq!(config.payment_methods, vec!["zelle"]);
        config.toggle_payment_method("zelle");
        assert!(config.payment_methods.is_empty());
    }
}
