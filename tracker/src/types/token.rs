use chrono::{DateTime, Utc};
use providers::TokenId;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::ops::RangeInclusive;

use crate::errors::TrackerError;

pub const MAX_RECENT_SALES: usize = 10;

/// Geometry of the fixed-size collection: ids `1..=size`, grouped into
/// seasons of `season_size` consecutive ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub size: u32,
    pub season_size: u32,
}

impl Collection {
    pub fn ids(&self) -> RangeInclusive<TokenId> {
        1..=self.size
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.ids().contains(&id)
    }

    pub fn check_id(&self, id: TokenId) -> Result<TokenId, TrackerError> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(TrackerError::TokenOutOfRange(id))
        }
    }

    pub fn season_of(&self, id: TokenId) -> u32 {
        season_of(id, self.season_size)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            size: 404,
            season_size: 100,
        }
    }
}

pub fn season_of(id: TokenId, season_size: u32) -> u32 {
    id.saturating_sub(1) / season_size.max(1) + 1
}

/// Slow-changing descriptive fields, safe to keep for days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub name: String,
    pub artist: String,
    pub image_url: String,
    pub thumbnail_url: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub price: f64,
    pub timestamp: Option<String>,
    pub transaction: Option<String>,
}

/// Market statistics; only ever taken from the latest fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub floor_price: f64,
    pub highest_offer: f64,
    pub total_supply: u64,
    pub unique_owners: u64,
    pub volume_24h: f64,
    pub volume_7d: f64,
    pub listed_count: u64,
    /// Most recent first, at most [`MAX_RECENT_SALES`].
    pub recent_sales: Vec<Sale>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub market: MarketData,
}

impl Token {
    pub fn season(&self, season_size: u32) -> u32 {
        season_of(self.id, season_size)
    }
}

/// Deduplicated tokens sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub tokens: Vec<Token>,
    pub season_size: u32,
    pub fetched_at: DateTime<Utc>,
    /// `false` when the walk stopped on a failed page or the page ceiling.
    pub complete: bool,
}

impl CollectionSnapshot {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|idx| &self.tokens[idx])
    }

    pub fn season_of(&self, token: &Token) -> u32 {
        token.season(self.season_size)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_tokens: u32,
    pub total_collectors: u64,
    pub total_volume: f64,
    pub floor_price: f64,
    pub market_cap: f64,
}

#[cfg(test)]
mod test {
    use super::{season_of, Collection};

    #[test]
    fn season_boundaries() {
        assert_eq!(season_of(1, 100), 1);
        assert_eq!(season_of(100, 100), 1);
        assert_eq!(season_of(101, 100), 2);
        assert_eq!(season_of(404, 100), 5);
    }

    #[test]
    fn season_formula_over_whole_range() {
        let collection = Collection::default();

        for id in collection.ids() {
            assert_eq!(
                collection.season_of(id),
                (id - 1) / collection.season_size + 1
            );
        }
        assert_eq!(collection.season_of(collection.size), 5);
    }

    #[test]
    fn id_range() {
        let collection = Collection::default();

        assert!(collection.check_id(0).is_err());
        assert!(collection.check_id(1).is_ok());
        assert!(collection.check_id(404).is_ok());
        assert!(collection.check_id(405).is_err());
    }
}
