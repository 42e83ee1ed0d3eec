//! Declarative extraction of [`Token`]s from raw listing records.
//!
//! Providers disagree on field names, so every token field has an ordered
//! list of [`Rule`]s and the first rule that finds a value wins. Values that a
//! provider leaves falsy (`null`, `false`, `""`, `0`) count as absent and the
//! next rule is tried.

use crate::types::{Identity, MarketData, Sale, Token, MAX_RECENT_SALES};
use providers::{indexer::parse_token_id, TokenId};
use serde_json::Value;

/// Image urls containing this fragment come from a mis-attributed duplicate
/// listing and are dropped.
pub const BAD_IMAGE_MARKER: &str = "0x0c58ef43ff3032005e472cb5";

const ARTIST_TRAITS: &[&str] = &["Artist", "artist"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Top-level key.
    Key(&'static str),
    /// Nested object path.
    Path(&'static [&'static str]),
    /// `value` of the first `{trait_type, value}` entry in the array at the
    /// given path whose `trait_type` is one of the names.
    Trait {
        path: &'static [&'static str],
        names: &'static [&'static str],
    },
}

impl Rule {
    pub fn extract<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let found = match self {
            Rule::Key(key) => record.get(key),
            Rule::Path(path) => walk(record, path),
            Rule::Trait { path, names } => walk(record, path)?
                .as_array()?
                .iter()
                .find(|attr| {
                    attr.get("trait_type")
                        .and_then(Value::as_str)
                        .map_or(false, |t| names.iter().any(|name| *name == t))
                })?
                .get("value"),
        };

        found.filter(|value| is_present(value))
    }
}

fn walk<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |value, key| value.get(key))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn first<'a>(rules: &[Rule], record: &'a Value) -> Option<&'a Value> {
    rules.iter().find_map(|rule| rule.extract(record))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.max(0.0) as u64))
        }
        _ => None,
    }
}

/// Per-field rule lists, in precedence order.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub id: &'static [Rule],
    pub name: &'static [Rule],
    pub artist: &'static [Rule],
    pub image: &'static [Rule],
    pub thumbnail: &'static [Rule],
    pub floor_price: &'static [Rule],
    pub highest_offer: &'static [Rule],
    pub total_supply: &'static [Rule],
    pub unique_owners: &'static [Rule],
    pub volume_24h: &'static [Rule],
    pub volume_7d: &'static [Rule],
    pub listed_count: &'static [Rule],
    pub recent_sales: &'static [Rule],
    pub sale_price: &'static [Rule],
    pub sale_timestamp: &'static [Rule],
    pub sale_transaction: &'static [Rule],
}

pub const SEIZE_RULES: FieldRules = FieldRules {
    id: &[Rule::Key("token_id"), Rule::Key("tokenId"), Rule::Key("id")],
    name: &[Rule::Key("name"), Rule::Path(&["metadata", "name"])],
    artist: &[
        Rule::Key("artist"),
        Rule::Trait {
            path: &["metadata", "attributes"],
            names: ARTIST_TRAITS,
        },
        Rule::Trait {
            path: &["attributes"],
            names: ARTIST_TRAITS,
        },
    ],
    image: &[
        Rule::Key("image"),
        Rule::Key("image_url"),
        Rule::Key("imageUrl"),
        Rule::Key("thumbnail"),
    ],
    thumbnail: &[
        Rule::Key("thumbnail"),
        Rule::Key("thumbnail_url"),
        Rule::Key("image"),
    ],
    floor_price: &[Rule::Key("floor_price"), Rule::Key("floorPrice")],
    highest_offer: &[Rule::Key("highest_offer"), Rule::Key("bestOffer")],
    total_supply: &[
        Rule::Key("supply"),
        Rule::Key("total_supply"),
        Rule::Key("totalSupply"),
    ],
    unique_owners: &[Rule::Key("unique_owners"), Rule::Key("uniqueOwners")],
    volume_24h: &[Rule::Key("volume_24h"), Rule::Key("volume24h")],
    volume_7d: &[Rule::Key("volume_7d"), Rule::Key("volume7d")],
    listed_count: &[Rule::Key("listed_count"), Rule::Key("listedCount")],
    recent_sales: &[Rule::Key("last_sales"), Rule::Key("lastSales")],
    sale_price: &[
        Rule::Key("price"),
        Rule::Key("eth_price"),
        Rule::Key("value"),
    ],
    sale_timestamp: &[
        Rule::Key("timestamp"),
        Rule::Key("date"),
        Rule::Key("created_at"),
    ],
    sale_transaction: &[
        Rule::Key("transaction"),
        Rule::Key("tx_hash"),
        Rule::Key("transaction_hash"),
    ],
};

/// Turns raw records into tokens using a [`FieldRules`] table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: FieldRules,
    bad_image_marker: &'static str,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(SEIZE_RULES)
    }
}

impl Normalizer {
    pub fn new(rules: FieldRules) -> Self {
        Self {
            rules,
            bad_image_marker: BAD_IMAGE_MARKER,
        }
    }

    fn token_id(&self, record: &Value) -> Option<TokenId> {
        let id = match first(self.rules.id, record)? {
            Value::String(s) => parse_token_id(s),
            value => integer(value).and_then(|id| TokenId::try_from(id).ok()),
        };

        id.filter(|id| *id > 0)
    }

    fn text(&self, rules: &[Rule], record: &Value) -> Option<String> {
        first(rules, record).and_then(text)
    }

    fn float(&self, rules: &[Rule], record: &Value) -> f64 {
        first(rules, record).and_then(float).unwrap_or_default()
    }

    fn integer(&self, rules: &[Rule], record: &Value) -> u64 {
        first(rules, record).and_then(integer).unwrap_or_default()
    }

    fn sales(&self, record: &Value) -> Vec<Sale> {
        first(self.rules.recent_sales, record)
            .and_then(Value::as_array)
            .map(|sales| {
                sales
                    .iter()
                    .filter(|sale| sale.is_object())
                    .take(MAX_RECENT_SALES)
                    .map(|sale| Sale {
                        price: self.float(self.rules.sale_price, sale),
                        timestamp: self.text(self.rules.sale_timestamp, sale),
                        transaction: self.text(self.rules.sale_transaction, sale),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `None` when the record has no usable id or carries a known-bad image.
    pub fn normalize(&self, record: &Value) -> Option<Token> {
        let id = self.token_id(record)?;

        let image_url = self.text(self.rules.image, record).unwrap_or_default();
        let thumbnail_url = self
            .text(self.rules.thumbnail, record)
            .unwrap_or_default();

        if image_url.contains(self.bad_image_marker) || thumbnail_url.contains(self.bad_image_marker)
        {
            log::debug!("dropping record for #{id}: known-bad image source");
            return None;
        }

        Some(Token {
            id,
            identity: Identity {
                name: self
                    .text(self.rules.name, record)
                    .unwrap_or_else(|| format!("Meme #{id}")),
                artist: self
                    .text(self.rules.artist, record)
                    .unwrap_or_else(|| "Unknown".to_string()),
                image_url,
                thumbnail_url,
            },
            market: MarketData {
                floor_price: self.float(self.rules.floor_price, record),
                highest_offer: self.float(self.rules.highest_offer, record),
                total_supply: self.integer(self.rules.total_supply, record),
                unique_owners: self.integer(self.rules.unique_owners, record),
                volume_24h: self.float(self.rules.volume_24h, record),
                volume_7d: self.float(self.rules.volume_7d, record),
                listed_count: self.integer(self.rules.listed_count, record),
                recent_sales: self.sales(record),
            },
        })
    }
}
