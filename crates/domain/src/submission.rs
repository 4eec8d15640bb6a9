//! Payloads for `POST /api/seller/list`, from the listing form and from
//! re-listing existing items during a sync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{lenient::parse_int_prefix, ListingItem, ListingKind};

/// Placeholder the bots store when a seller left the field empty.
pub const NO_INFORMATION_PLACEHOLDER: &str = "No Information Provided.";

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 16;

/// Body of a list request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub item: ListItemPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemPayload {
    pub username: String,
    /// Whole dollars; `null` when a synced item carried an unreadable price.
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_ign: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mining: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<String>,
}

/// Client-side validation failures, raised before the list request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("`{0}` is not a valid Minecraft username")]
    InvalidUsername(String),
    #[error("no Minecraft account is named `{0}`")]
    UnknownUsername(String),
    #[error("for alts, at least one of farming or mining must be selected")]
    AltWithoutActivity,
    #[error("price `{0}` is not a whole number")]
    InvalidPrice(String),
}

/// Values entered in the new-listing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingForm {
    pub kind: ListingKind,
    pub username: String,
    pub price: String,
    pub additional_information: String,
    pub show_ign: bool,
    pub profile: String,
    pub farming: bool,
    pub mining: bool,
}

impl Default for ListingForm {
    fn default() -> Self {
        Self {
            kind: ListingKind::Account,
            username: String::new(),
            price: String::new(),
            additional_information: String::new(),
            show_ign: true,
            profile: String::new(),
            farming: true,
            mining: false,
        }
    }
}

/// Minecraft names are 3 to 16 characters of letters, digits and `_`.
/// This only pre-filters; whether the account exists is a remote lookup.
pub fn validate_username(username: &str) -> Result<(), SubmissionError> {
    let valid_len = (USERNAME_MIN..=USERNAME_MAX).contains(&username.len());
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(SubmissionError::InvalidUsername(username.to_string()))
    }
}

impl ListingForm {
    /// Validates the form and builds the request. Nothing is sent when this
    /// fails.
    pub fn build(&self, payment_methods: Option<&str>) -> Result<ListRequest, SubmissionError> {
        validate_username(&self.username)?;
        if self.kind == ListingKind::Alt && !self.farming && !self.mining {
            return Err(SubmissionError::AltWithoutActivity);
        }
        let price = parse_int_prefix(&self.price)
            .ok_or_else(|| SubmissionError::InvalidPrice(self.price.clone()))?;

        let mut item = ListItemPayload {
            username: self.username.clone(),
            price: Some(price),
            payment_methods: payment_methods.map(str::to_string),
            ..ListItemPayload::default()
        };

        match self.kind {
            ListingKind::Account | ListingKind::Profile => {
                if !self.additional_information.trim().is_empty() {
                    item.additional_information = Some(self.additional_information.clone());
                }
                item.show_ign = Some(self.show_ign);
                if !self.profile.trim().is_empty() {
                    item.profile = Some(self.profile.clone());
                }
            }
            ListingKind::Alt => {
                item.farming = Some(self.farming);
                item.mining = Some(self.mining);
            }
        }

        Ok(ListRequest {
            kind: self.kind,
            item,
        })
    }
}

/// Re-list request for an item already listed on some server. Alts default
/// to farming and are never sent with both activities off.
pub fn sync_request(kind: ListingKind, listing: &ListingItem, payment_methods: Option<&str>) -> ListRequest {
    let mut item = ListItemPayload {
        username: listing.username.clone(),
        price: listing.price,
        payment_methods: payment_methods.map(str::to_string),
        ..ListItemPayload::default()
    };

    match kind {
        ListingKind::Account | ListingKind::Profile => {
            item.additional_information = listing
                .additional_information
                .clone()
                .filter(|info| !info.is_empty() && info != NO_INFORMATION_PLACEHOLDER);
            item.show_ign = listing.show_ign;
            item.profile = listing.profile.clone().filter(|profile| !profile.is_empty());
        }
        ListingKind::Alt => {
            let mining = listing.mining == Some(true);
            let farming = listing.farming != Some(false) || !mining;
            item.farming = Some(farming);
            item.mining = Some(mining);
        }
    }

    ListRequest { kind, item }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(kind: ListingKind) -> ListingForm {
        ListingForm {
            kind,
            username: "Technoblade".into(),
            price: "25".into(),
            ..ListingForm::default()
        }
    }

    #[test]
    fn alt_without_activity_is_rejected() {
        let mut alt = form(ListingKind::Alt);
        alt.farming = false;
        alt.mining = false;
        assert_eq!(alt.build(None), Err(SubmissionError::AltWithoutActivity));

        alt.mining = true;
        let request = alt.build(None).unwrap();
        assert_eq!(request.item.farming, Some(false));
        assert_eq!(request.item.mining, Some(true));
        assert_eq!(request.item.show_ign, None);
    }

    #[test]
    fn form_validates_username_and_price() {
        let mut bad_name = form(ListingKind::Account);
        bad_name.username = "ab".into();
        assert!(matches!(bad_name.build(None), Err(SubmissionError::InvalidUsername(_))));

        let mut bad_price = form(ListingKind::Account);
        bad_price.price = "free".into();
        assert_eq!(bad_price.build(None), Err(SubmissionError::InvalidPrice("free".into())));

        let mut decimal = form(ListingKind::Account);
        decimal.price = "19.99".into();
        assert_eq!(decimal.build(None).unwrap().item.price, Some(19));
    }

    #[test]
    fn account_form_serializes_optional_fields() {
        let mut account = form(ListingKind::Profile);
        account.additional_information = "  ".into();
        account.profile = "Mango".into();
        let request = account.build(Some("paypal/usdt")).unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "type": "profile",
                "item": {
                    "username": "Technoblade",
                    "price": 25,
                    "show_ign": true,
                    "profile": "Mango",
                    "payment_methods": "paypal/usdt"
                }
            })
        );
    }

    #[test]
    fn sync_drops_placeholder_information() {
        let mut listing = ListingItem::new(ListingKind::Account, "u", 1);
        listing.username = "Steve".into();
        listing.price = Some(30);
        listing.additional_information = Some(NO_INFORMATION_PLACEHOLDER.into());
        listing.show_ign = Some(false);

        let request = sync_request(ListingKind::Account, &listing, None);
        assert_eq!(request.item.additional_information, None);
        assert_eq!(request.item.show_ign, Some(false));
        assert_eq!(request.item.payment_methods, None);
    }

    #[test]
    fn sync_alt_defaults_keep_one_activity() {
        let mut alt = ListingItem::new(ListingKind::Alt, "u", 1);
        let request = sync_request(ListingKind::Alt, &alt, None);
        assert_eq!((request.item.farming, request.item.mining), (Some(true), Some(false)));

        alt.farming = Some(false);
        alt.mining = Some(false);
        let request = sync_request(ListingKind::Alt, &alt, None);
        assert_eq!((request.item.farming, request.item.mining), (Some(true), Some(false)));

        alt.mining = Some(true);
        let request = sync_request(ListingKind::Alt, &alt, Some("zelle"));
        assert_eq!((request.item.farming, request.item.mining), (Some(false), Some(true)));
        assert_eq!(request.item.payment_methods.as_deref(), Some("zelle"));
    }

    #[test]
    fn sync_serializes_unreadable_price_as_null() {
        let listing = ListingItem::new(ListingKind::Account, "u", 1);
        let encoded = serde_json::to_value(sync_request(ListingKind::Account, &listing, None)).unwrap();
        assert_eq!(encoded["item"]["price"], serde_json::Value::Null);
    }
}
