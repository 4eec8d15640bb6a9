//! Client-side narrowing of already fetched collections: bot listings,
//! the verification queue and storefront categories.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::model::{AuthAction, ListingItem, ListingKind, ListingSet, ShopInfo, ShopItem};

/// Leading float of `raw`, the way `parseFloat` reads it (`"12.5abc"` is
/// `12.5`, `"abc"` is `None`).
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                let sign = matches!(bytes.get(end + 1), Some(b'-') | Some(b'+'));
                let digit_at = if sign { end + 2 } else { end + 1 };
                if !bytes.get(digit_at).is_some_and(u8::is_ascii_digit) {
                    break;
                }
                seen_exp = true;
                end = digit_at;
            }
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].parse().ok()
}

/// Expands `1.5b`, `200m`, `12k`, `3t`. Empty input counts as 0; input
/// that is not a number yields NaN, which fails every threshold.
pub fn unabbreviate_number(raw: &str) -> f64 {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return 0.0;
    }
    let multiplier = match lowered.chars().last() {
        Some('k') => Some(1e3),
        Some('m') => Some(1e6),
        Some('b') => Some(1e9),
        Some('t') => Some(1e12),
        _ => None,
    };
    let parsed = match multiplier {
        Some(multiplier) => {
            parse_float_prefix(&lowered[..lowered.len() - 1]).map(|value| value * multiplier)
        }
        None => parse_float_prefix(&lowered),
    };
    parsed.unwrap_or(f64::NAN)
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TypeFilter {
    #[default]
    All,
    Account,
    Alt,
    Profile,
}

impl TypeFilter {
    fn includes(self, kind: ListingKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Account => kind == ListingKind::Account,
            TypeFilter::Alt => kind == ListingKind::Alt,
            TypeFilter::Profile => kind == ListingKind::Profile,
        }
    }
}

/// Minimum stat thresholds plus a price window for the bot listings view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilters {
    pub kind: TypeFilter,
    pub catacombs_level: f64,
    /// Minimum liquid networth.
    pub coins: f64,
    /// Minimum total networth.
    pub networth: f64,
    pub skill_average: f64,
    pub zombie_slayer: f64,
    pub spider_slayer: f64,
    pub wolf_slayer: f64,
    pub enderman_slayer: f64,
    pub blaze_slayer: f64,
    pub vampire_slayer: f64,
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for ListingFilters {
    fn default() -> Self {
        Self {
            kind: TypeFilter::All,
            catacombs_level: 0.0,
            coins: 0.0,
            networth: 0.0,
            skill_average: 0.0,
            zombie_slayer: 0.0,
            spider_slayer: 0.0,
            wolf_slayer: 0.0,
            enderman_slayer: 0.0,
            blaze_slayer: 0.0,
            vampire_slayer: 0.0,
            min_price: 0.0,
            max_price: 10_000.0,
        }
    }
}

impl ListingFilters {
    /// Stat name, its threshold, and whether the stat is abbreviated.
    /// Only the networth stats carry suffixes.
    fn thresholds(&self) -> [(&'static str, f64, bool); 10] {
        [
            ("catacombs_level", self.catacombs_level, false),
            ("liquid_networth", self.coins, true),
            ("total_networth", self.networth, true),
            ("skill_average", self.skill_average, false),
            ("zombie_slayer_level", self.zombie_slayer, false),
            ("spider_slayer_level", self.spider_slayer, false),
            ("wolf_slayer_level", self.wolf_slayer, false),
            ("enderman_slayer_level", self.enderman_slayer, false),
            ("blaze_slayer_level", self.blaze_slayer, false),
            ("vampire_slayer_level", self.vampire_slayer, false),
        ]
    }

    /// Whether `item` clears every threshold and sits inside the price
    /// window. Missing stats count as 0; a missing price never matches.
    pub fn matches(&self, item: &ListingItem) -> bool {
        let stats_ok = self.thresholds().iter().all(|&(name, minimum, abbreviated)| {
            let value = item
                .stat(name)
                .map(|stat| {
                    if abbreviated {
                        stat.as_abbreviated_f64()
                    } else {
                        stat.as_f64()
                    }
                })
                .unwrap_or(0.0);
            value >= minimum
        });
        let price_ok = item
            .price
            .map(|price| price as f64)
            .is_some_and(|price| price >= self.min_price && price <= self.max_price);
        stats_ok && price_ok
    }

    /// Matching items, accounts first, then alts, then profiles.
    pub fn apply<'a>(&self, listings: &'a ListingSet) -> Vec<(ListingKind, &'a ListingItem)> {
        [ListingKind::Account, ListingKind::Alt, ListingKind::Profile]
            .into_iter()
            .filter(|kind| self.kind.includes(*kind))
            .flat_map(|kind| listings.collection(kind).iter().map(move |item| (kind, item)))
            .filter(|(_, item)| self.matches(item))
            .collect()
    }
}

/// Narrowing of the verification queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthActionFilter {
    pub show_resolved: bool,
    /// Raw action type to keep; `None` keeps every type.
    pub action_type: Option<String>,
}

impl AuthActionFilter {
    pub fn matches(&self, action: &AuthAction) -> bool {
        if action.resolved && !self.show_resolved {
            return false;
        }
        match &self.action_type {
            Some(wanted) => action.action_type == *wanted,
            None => true,
        }
    }

    pub fn apply<'a>(&self, actions: &'a [AuthAction]) -> Vec<&'a AuthAction> {
        actions.iter().filter(|action| self.matches(action)).collect()
    }
}

/// Storefront tabs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ShopCategory {
    #[default]
    All,
    Accounts,
    Profiles,
    Alts,
}

impl ShopCategory {
    pub fn title(self) -> &'static str {
        match self {
            ShopCategory::All => "All Items",
            ShopCategory::Accounts => "Accounts",
            ShopCategory::Profiles => "Profiles",
            ShopCategory::Alts => "Alts",
        }
    }

    /// Substring match on type and description (and profile for alts).
    /// Items without a type land under accounts. Categories overlap.
    pub fn contains(self, item: &ShopItem) -> bool {
        let has = |field: &Option<String>, needle: &str| {
            field
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(needle))
        };
        match self {
            ShopCategory::All => true,
            ShopCategory::Accounts => {
                has(&item.kind, "account") || has(&item.description, "account") || item.kind.is_none()
            }
            ShopCategory::Profiles => has(&item.kind, "profile") || has(&item.description, "profile"),
            ShopCategory::Alts => {
                has(&item.kind, "alt") || has(&item.description, "alt") || has(&item.profile, "alt")
            }
        }
    }

    pub fn items(self, shop: &ShopInfo) -> Vec<&ShopItem> {
        shop.all_items().filter(|item| self.contains(item)).collect()
    }
}
