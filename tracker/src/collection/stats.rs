use crate::types::{Collection, CollectionStats};
use providers::RawCollectionStats;

const DEFAULT_COLLECTORS: u64 = 12_000;
const DEFAULT_VOLUME: f64 = 50_000.0;
const DEFAULT_FLOOR: f64 = 0.08;
const DEFAULT_MARKET_CAP: f64 = 100_000.0;

impl CollectionStats {
    /// Values served when the stats endpoint is unreachable.
    pub fn fallback(collection: &Collection) -> Self {
        Self {
            total_tokens: collection.size,
            total_collectors: DEFAULT_COLLECTORS,
            total_volume: DEFAULT_VOLUME,
            floor_price: DEFAULT_FLOOR,
            market_cap: DEFAULT_MARKET_CAP,
        }
    }

    /// Fills whatever the endpoint left out (or reported as zero) from
    /// [`CollectionStats::fallback`]. A reported supply replaces the
    /// configured collection size.
    pub fn from_raw(raw: RawCollectionStats, collection: &Collection) -> Self {
        let fallback = Self::fallback(collection);
        let positive = |value: Option<f64>| value.filter(|v| *v > 0.0);

        Self {
            total_tokens: raw
                .total_supply
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(fallback.total_tokens),
            total_collectors: raw
                .num_owners
                .filter(|n| *n > 0)
                .unwrap_or(fallback.total_collectors),
            total_volume: positive(raw.total_volume).unwrap_or(fallback.total_volume),
            floor_price: positive(raw.floor_price).unwrap_or(fallback.floor_price),
            market_cap: positive(raw.market_cap).unwrap_or(fallback.market_cap),
        }
    }
}
