use crate::types::{AggregateHoldings, CollectionSnapshot, Token, TokenId, WalletHoldings};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

/// Length of the `top_by_*` lists.
pub const TOP_TOKENS: usize = 5;

/// Highest `key` first, ties by id. `positive_only` drops tokens whose key
/// is zero or below.
fn top_by(owned: &[Token], key: impl Fn(&Token) -> f64, positive_only: bool) -> Vec<Token> {
    let mut ranked: Vec<&Token> = owned
        .iter()
        .filter(|token| !positive_only || key(token) > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });

    ranked.into_iter().take(TOP_TOKENS).cloned().collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Ownership statistics of `wallets` against `snapshot`. Wallets sharing an
/// address are counted once, so the result does not depend on the order or
/// repetition of the input.
pub fn aggregate(wallets: &[WalletHoldings], snapshot: &CollectionSnapshot) -> AggregateHoldings {
    let mut by_address = BTreeMap::new();
    for wallet in wallets {
        by_address
            .entry(wallet.address)
            .or_insert_with(BTreeSet::new)
            .extend(wallet.owned_token_ids.iter().copied());
    }

    let mut ownership_counts: BTreeMap<TokenId, usize> = BTreeMap::new();
    for id in by_address.values().flatten() {
        *ownership_counts.entry(*id).or_default() += 1;
    }

    let all_owned: BTreeSet<TokenId> = ownership_counts.keys().copied().collect();
    let duplicates: BTreeSet<TokenId> = ownership_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(id, _)| *id)
        .collect();

    let (owned, missing): (Vec<Token>, Vec<Token>) = snapshot
        .tokens
        .iter()
        .cloned()
        .partition(|token| all_owned.contains(&token.id));

    let mut season_breakdown = BTreeMap::new();
    for token in &missing {
        *season_breakdown
            .entry(snapshot.season_of(token))
            .or_default() += 1;
    }

    let completion = if snapshot.is_empty() {
        0.0
    } else {
        let ratio = all_owned.len() as f64 / snapshot.len() as f64 * 100.0;
        round_one_decimal(ratio.min(100.0))
    };

    AggregateHoldings {
        wallet_count: by_address.len(),
        duplicate_count: duplicates.len(),
        owned_count: owned.len(),
        missing_count: missing.len(),
        owned_floor_value: owned.iter().map(|t| t.market.floor_price).sum(),
        owned_offer_value: owned.iter().map(|t| t.market.highest_offer).sum(),
        missing_floor_cost: missing.iter().map(|t| t.market.floor_price).sum(),
        missing_offer_cost: missing.iter().map(|t| t.market.highest_offer).sum(),
        top_by_floor: top_by(&owned, |t| t.market.floor_price, false),
        top_by_offer: top_by(&owned, |t| t.market.highest_offer, true),
        season_breakdown,
        completion,
        all_owned,
        ownership_counts,
        duplicates,
        owned,
        missing,
    }
}
