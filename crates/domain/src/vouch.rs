//! Vouch presentation: mention parsing, seller attribution, highlighting
//! and Discord snowflake timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ShopInfo, Vouch};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// A seller as known to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerRef {
    pub id: String,
    pub name: String,
}

/// Sellers that have a Discord member with a display name, in the order
/// the shop reported them.
pub fn shop_sellers(shop: &ShopInfo) -> Vec<SellerRef> {
    shop.sellers
        .iter()
        .filter_map(|(id, seller)| {
            let name = seller.discord_member.as_ref()?.display_name.clone()?;
            Some(SellerRef {
                id: id.clone(),
                name,
            })
        })
        .collect()
}

/// A `<@id>` user mention found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention<'a> {
    pub user_id: &'a str,
    pub start: usize,
    pub end: usize,
}

/// All `<@digits>` mentions in order of appearance.
pub fn mentions(message: &str) -> Vec<Mention<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = message[cursor..].find("<@") {
        let start = cursor + offset;
        let digits_start = start + 2;
        let digits_len = message[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let close = digits_start + digits_len;
        if digits_len > 0 && message.as_bytes().get(close) == Some(&b'>') {
            found.push(Mention {
                user_id: &message[digits_start..close],
                start,
                end: close + 1,
            });
            cursor = close + 1;
        } else {
            cursor = digits_start;
        }
    }
    found
}

/// Seller a vouch is about: a mentioned seller first, then a seller whose
/// name appears in the text (case-insensitive).
pub fn attributed_seller<'a>(message: &str, sellers: &'a [SellerRef]) -> Option<&'a SellerRef> {
    let mentioned: Vec<&str> = mentions(message).iter().map(|m| m.user_id).collect();
    if let Some(seller) = sellers.iter().find(|s| mentioned.contains(&s.id.as_str())) {
        return Some(seller);
    }
    let lowered = message.to_lowercase();
    sellers
        .iter()
        .find(|seller| !seller.name.is_empty() && lowered.contains(&seller.name.to_lowercase()))
}

pub fn mentions_seller(message: &str, sellers: &[SellerRef]) -> bool {
    attributed_seller(message, sellers).is_some()
}

/// Typed pieces of a highlighted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    /// A seller, either mentioned by ID (`mentioned`) or named in the text.
    /// `name` is the seller's display name for mentions and the matched
    /// text otherwise.
    Seller { name: String, mentioned: bool },
    /// Any other `@word`.
    Mention { name: String },
}

impl Segment {
    /// Plain text rendering: seller mentions become `@name`.
    pub fn render(&self) -> String {
        match self {
            Segment::Text { text } => text.clone(),
            Segment::Seller { name, mentioned: true } => format!("@{name}"),
            Segment::Seller { name, mentioned: false } => name.clone(),
            Segment::Mention { name } => format!("@{name}"),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text { text: last }) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Text {
            text: text.to_string(),
        });
    }
}

/// Finds a seller name at a word boundary starting exactly at `at`.
fn seller_name_at<'a>(text: &str, at: usize, sellers: &'a [SellerRef]) -> Option<(&'a SellerRef, usize)> {
    if text[..at].chars().next_back().is_some_and(is_word_char) {
        return None;
    }
    sellers.iter().find_map(|seller| {
        if seller.name.is_empty() {
            return None;
        }
        let candidate = text.get(at..at + seller.name.len())?;
        if candidate.to_lowercase() != seller.name.to_lowercase() {
            return None;
        }
        let end = at + seller.name.len();
        if text[end..].chars().next().is_some_and(is_word_char) {
            return None;
        }
        Some((seller, end))
    })
}

/// Splits a plain-text run into seller names, `@word` mentions and text.
/// Raw `<@id>` mentions of non-sellers are left untouched.
fn highlight_run(segments: &mut Vec<Segment>, text: &str, sellers: &[SellerRef]) {
    let mut plain_start = 0;
    let mut index = 0;
    while index < text.len() {
        if let Some((_, end)) = seller_name_at(text, index, sellers) {
            push_text(segments, &text[plain_start..index]);
            segments.push(Segment::Seller {
                name: text[index..end].to_string(),
                mentioned: false,
            });
            index = end;
            plain_start = end;
            continue;
        }
        if text[index..].starts_with('@') && !text[..index].ends_with('<') {
            let word_len: usize = text[index + 1..]
                .chars()
                .take_while(|c| is_word_char(*c))
                .map(char::len_utf8)
                .sum();
            if word_len > 0 {
                push_text(segments, &text[plain_start..index]);
                let end = index + 1 + word_len;
                segments.push(Segment::Mention {
                    name: text[index + 1..end].to_string(),
                });
                index = end;
                plain_start = end;
                continue;
            }
        }
        index += text[index..].chars().next().map_or(1, char::len_utf8);
    }
    push_text(segments, &text[plain_start..]);
}

/// Highlights a vouch message. Mentions of known sellers become
/// [`Segment::Seller`]; mentions of anyone else stay as raw text.
pub fn highlight(message: &str, sellers: &[SellerRef]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for mention in mentions(message) {
        let Some(seller) = sellers.iter().find(|s| s.id == mention.user_id) else {
            continue;
        };
        highlight_run(&mut segments, &message[cursor..mention.start], sellers);
        segments.push(Segment::Seller {
            name: seller.name.clone(),
            mentioned: true,
        });
        cursor = mention.end;
    }
    highlight_run(&mut segments, &message[cursor..], sellers);
    segments
}

/// Creation time encoded in a Discord snowflake.
pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.trim().parse().ok()?;
    let millis = i64::try_from(raw >> 22).ok()? + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(millis)
}

/// Time shown next to a vouch: taken from the first mentioned user's ID,
/// falling back to the author's ID.
pub fn vouch_timestamp(vouch: &Vouch) -> Option<DateTime<Utc>> {
    mentions(&vouch.message)
        .first()
        .and_then(|mention| snowflake_timestamp(mention.user_id))
        .or_else(|| snowflake_timestamp(&vouch.user_id))
}

/// Vouches to display, newest first. `seller` keeps vouches whose author
/// name or message contains it (case-insensitive) or that are attributed to
/// a seller of exactly that name.
pub fn filter_vouches<'a>(shop: &'a ShopInfo, seller: Option<&str>) -> Vec<&'a Vouch> {
    let sellers = shop_sellers(shop);
    let mut selected: Vec<&Vouch> = match seller {
        None => shop.vouches.iter().collect(),
        Some(wanted) => {
            let needle = wanted.to_lowercase();
            shop.vouches
                .iter()
                .filter(|vouch| {
                    vouch.username.to_lowercase().contains(&needle)
                        || vouch.message.to_lowercase().contains(&needle)
                        || attributed_seller(&vouch.message, &sellers).is_some_and(|s| s.name == wanted)
                })
                .collect()
        }
    };
    selected.reverse();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sellers() -> Vec<SellerRef> {
        vec![
            SellerRef {
                id: "111".into(),
                name: "Noemt".into(),
            },
            SellerRef {
                id: "222".into(),
                name: "Kiwi".into(),
            },
        ]
    }

    #[test]
    fn parses_numeric_mentions_only() {
        let found = mentions("thanks <@111> and <@abc> and <@!5> <@222>");
        let ids: Vec<&str> = found.iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec!["111", "222"]);
        assert_eq!(found[0].start, 7);
        assert_eq!(found[0].end, 13);
    }

    #[test]
    fn attribution_prefers_mentions_over_names() {
        let sellers = sellers();
        assert_eq!(
            attributed_seller("kiwi was slow but <@111> fixed it", &sellers).map(|s| s.name.as_str()),
            Some("Noemt")
        );
        assert_eq!(
            attributed_seller("bought from KIWI", &sellers).map(|s| s.name.as_str()),
            Some("Kiwi")
        );
        assert!(!mentions_seller("<@999> legit", &sellers));
    }

    #[test]
    fn highlight_produces_typed_segments() {
        let segments = highlight("<@111> legit, ask kiwi or @bob. <@999>", &sellers());
        assert_eq!(
            segments,
            vec![
                Segment::Seller {
                    name: "Noemt".into(),
                    mentioned: true
                },
                Segment::Text {
                    text: " legit, ask ".into()
                },
                Segment::Seller {
                    name: "kiwi".into(),
                    mentioned: false
                },
                Segment::Text { text: " or ".into() },
                Segment::Mention { name: "bob".into() },
                Segment::Text {
                    text: ". <@999>".into()
                },
            ]
        );
        let rendered: String = segments.iter().map(Segment::render).collect();
        assert_eq!(rendered, "@Noemt legit, ask kiwi or @bob. <@999>");
    }

    #[test]
    fn seller_names_need_word_boundaries() {
        let segments = highlight("kiwifruit", &sellers());
        assert_eq!(
            segments,
            vec![Segment::Text {
                text: "kiwifruit".into()
            }]
        );
    }

    #[test]
    fn snowflake_decodes_to_creation_time() {
        let time = snowflake_timestamp("175928847299117063").unwrap();
        assert_eq!(time.timestamp_millis(), 1_462_015_105_796);
        assert_eq!(snowflake_timestamp("not-an-id"), None);
    }

    #[test]
    fn vouch_time_prefers_first_mention() {
        let vouch = Vouch {
            user_id: "175928847299117063".into(),
            message: "great <@0>".into(),
            avatar_url: None,
            username: "buyer".into(),
        };
        assert_eq!(
            vouch_timestamp(&vouch).map(|t| t.timestamp_millis()),
            Some(DISCORD_EPOCH_MS)
        );
    }

    #[test]
    fn vouches_are_filtered_and_newest_first() {
        let shop: ShopInfo = serde_json::from_value(json!({
            "sellers": {
                "111": {"discord_member": {"display_name": "Noemt"}},
                "333": {"discord_member": null}
            },
            "vouches": [
                ["1", "first <@111>", null, "alice"],
                ["2", "second, no seller", null, "bob"],
                ["3", "third via noemt", null, "carol"]
            ]
        }))
        .unwrap();

        assert_eq!(shop_sellers(&shop).len(), 1);

        let all: Vec<&str> = filter_vouches(&shop, None).iter().map(|v| v.user_id.as_str()).collect();
        assert_eq!(all, vec!["3", "2", "1"]);

        let noemt: Vec<&str> = filter_vouches(&shop, Some("Noemt"))
            .iter()
            .map(|v| v.user_id.as_str())
            .collect();
        assert_eq!(noemt, vec!["3", "1"]);
    }
}
