use crate::{
    errors::ProviderError,
    indexer::{
        http_client, send_json,
        types::{SeizePage, SeizeStats},
    },
    Address, CollectionLister, ListingPage, RawCollectionStats, StatsProvider,
};
use async_trait::async_trait;

pub const BASE_URL: &str = "https://api.seize.io/api";
const NFTS: &str = "nfts";
const COLLECTION_STATS: &str = "collection/stats";

pub struct SeizeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl SeizeProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CollectionLister for SeizeProvider {
    async fn list_page(
        &self,
        contract: Address,
        page: u32,
        page_size: u32,
    ) -> Result<ListingPage, ProviderError> {
        let body: SeizePage = send_json(
            self.client
                .get(format!("{}/{NFTS}", self.base_url))
                .query(&[
                    ("contract_address", format!("{contract:#x}")),
                    ("page", page.to_string()),
                    ("page_size", page_size.to_string()),
                ]),
        )
        .await?;

        let has_more = body.has_more();

        Ok(ListingPage {
            records: body.data,
            has_more,
        })
    }
}

#[async_trait]
impl StatsProvider for SeizeProvider {
    async fn collection_stats(
        &self,
        contract: Address,
    ) -> Result<RawCollectionStats, ProviderError> {
        let body: SeizeStats = send_json(
            self.client
                .get(format!("{}/{COLLECTION_STATS}", self.base_url))
                .query(&[("contract_address", format!("{contract:#x}"))]),
        )
        .await?;

        Ok(RawCollectionStats {
            total_supply: body.total_supply,
            num_owners: body.num_owners.or(body.unique_owners),
            total_volume: body.total_volume.or(body.volume_all_time),
            floor_price: body.floor_price,
            market_cap: body.market_cap,
        })
    }
}
