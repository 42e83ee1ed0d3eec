use super::Token;
use chrono::{DateTime, Utc};
use providers::{evm::to_checksum, Address, TokenId};
use serde::{Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::collections::{BTreeMap, BTreeSet};

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_checksum(address))
}

/// One wallet's resolved state. Refreshing a wallet replaces the whole value.
#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletHoldings {
    #[serde(serialize_with = "checksummed")]
    pub address: Address,
    pub display_name: Option<String>,
    pub owned_token_ids: BTreeSet<TokenId>,
    pub last_checked: DateTime<Utc>,
    /// Provider that supplied `owned_token_ids`; `None` when every provider failed.
    pub source: Option<String>,
    pub complete: bool,
}

impl WalletHoldings {
    pub fn total_owned(&self) -> usize {
        self.owned_token_ids.len()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateHoldings {
    pub wallet_count: usize,
    pub all_owned: BTreeSet<TokenId>,
    /// How many of the wallets hold each owned id.
    pub ownership_counts: BTreeMap<TokenId, usize>,
    /// Ids held by more than one wallet.
    pub duplicates: BTreeSet<TokenId>,
    pub duplicate_count: usize,
    pub owned: Vec<Token>,
    pub missing: Vec<Token>,
    pub owned_count: usize,
    pub missing_count: usize,
    pub owned_floor_value: f64,
    pub owned_offer_value: f64,
    pub missing_floor_cost: f64,
    pub missing_offer_cost: f64,
    /// Missing tokens per season.
    pub season_breakdown: BTreeMap<u32, usize>,
    /// Percent of the snapshot owned, one decimal.
    pub completion: f64,
    pub top_by_floor: Vec<Token>,
    pub top_by_offer: Vec<Token>,
}
