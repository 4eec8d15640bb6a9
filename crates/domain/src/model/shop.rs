use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient;

/// Storefront payload of `GET /api/bot/{bot}/shop/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopInfo {
    #[serde(
        default,
        deserialize_with = "lenient::ordered_entries",
        serialize_with = "lenient::serialize_entries"
    )]
    pub listings: Vec<(String, Vec<ShopItem>)>,
    #[serde(
        default,
        deserialize_with = "lenient::ordered_entries",
        serialize_with = "lenient::serialize_entries"
    )]
    pub sellers: Vec<(String, ShopSeller)>,
    #[serde(default)]
    pub vouches: Vec<Vouch>,
    #[serde(default)]
    pub guild: Option<ShopGuild>,
}

impl ShopInfo {
    /// Every listed item across all categories, in received order.
    pub fn all_items(&self) -> impl Iterator<Item = &ShopItem> {
        self.listings.iter().flat_map(|(_, items)| items.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopGuild {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// An item in the public storefront. Only the fields used for grouping are
/// modelled; the rest travels in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_price")]
    pub price: Option<i64>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopSeller {
    #[serde(default)]
    pub discord_member: Option<DiscordMember>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscordMember {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// A customer testimonial. On the wire a vouch is the positional array
/// `[user_id, message, avatar_url, username]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vouch {
    pub user_id: String,
    pub message: String,
    pub avatar_url: Option<String>,
    pub username: String,
}

impl<'de> Deserialize<'de> for Vouch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Vec::<Value>::deserialize(deserializer)?;
        if fields.len() < 2 {
            return Err(de::Error::invalid_length(fields.len(), &"at least 2 vouch fields"));
        }
        let mut fields = fields.into_iter();
        let mut next_text = || fields.next().and_then(lenient::value_to_id);

        Ok(Self {
            user_id: next_text().unwrap_or_default(),
            message: next_text().unwrap_or_default(),
            avatar_url: next_text().filter(|url| !url.is_empty()),
            username: next_text().unwrap_or_default(),
        })
    }
}

impl Serialize for Vouch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.user_id, &self.message, &self.avatar_url, &self.username).serialize(serializer)
    }
}

/// Body of the ticket opening endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketResponse {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of `GET /custom/bot/name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotNameResponse {
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_positional_vouches() {
        let vouch: Vouch = serde_json::from_value(json!([
            175928847299117063_u64,
            "great seller <@42>",
            "https://cdn.example/a.png",
            "buyer"
        ]))
        .unwrap();
        assert_eq!(vouch.user_id, "175928847299117063");
        assert_eq!(vouch.username, "buyer");
        assert_eq!(vouch.avatar_url.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn short_vouch_defaults_missing_fields() {
        let vouch: Vouch = serde_json::from_value(json!(["1", "ok"])).unwrap();
        assert_eq!(vouch.username, "");
        assert_eq!(vouch.avatar_url, None);
        assert!(serde_json::from_value::<Vouch>(json!(["1"])).is_err());
    }

    #[test]
    fn shop_keeps_category_and_seller_order() {
        let shop: ShopInfo = serde_json::from_value(json!({
            "listings": {
                "zeta": [{"type": "Alt", "price": "10"}],
                "alpha": [{"type": "Account", "price": 25}]
            },
            "sellers": {
                "9": {"discord_member": {"display_name": "Nine"}},
                "3": {}
            },
            "vouches": []
        }))
        .unwrap();
        let categories: Vec<&str> = shop.listings.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(categories, vec!["zeta", "alpha"]);
        assert_eq!(shop.all_items().filter_map(|item| item.price).sum::<i64>(), 35);
        assert_eq!(shop.sellers[0].0, "9");
    }
}
