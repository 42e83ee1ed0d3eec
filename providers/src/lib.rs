pub mod errors;
pub mod evm;
pub mod indexer;

use async_trait::async_trait;

pub use errors::ProviderError;
pub use evm::{parse_address, BatchBalanceClient, ReverseNameResolver, RpcProvider};
pub use web3::types::{Address, U256};

pub type TokenId = u32;

/// Ids a single source reports for one wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedTokens {
    pub ids: Vec<TokenId>,
    /// `false` when some part of the lookup (an on-chain batch) was dropped.
    pub complete: bool,
}

impl OwnedTokens {
    pub fn complete(ids: Vec<TokenId>) -> Self {
        Self {
            ids,
            complete: true,
        }
    }
}

/// One page of raw records from a collection listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub records: Vec<serde_json::Value>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCollectionStats {
    pub total_supply: Option<u64>,
    pub num_owners: Option<u64>,
    pub total_volume: Option<f64>,
    pub floor_price: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Read-only contract call against a JSON-RPC node.
#[async_trait]
pub trait EthCaller: Send + Sync {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError>;
}

#[async_trait]
pub trait HoldingsQuerier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn owned_tokens(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError>;
}

#[async_trait]
pub trait NameResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve_name(&self, wallet: Address) -> Result<Option<String>, ProviderError>;
}

#[async_trait]
pub trait CollectionLister: Send + Sync {
    async fn list_page(
        &self,
        contract: Address,
        page: u32,
        page_size: u32,
    ) -> Result<ListingPage, ProviderError>;
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn collection_stats(&self, contract: Address)
        -> Result<RawCollectionStats, ProviderError>;
}
