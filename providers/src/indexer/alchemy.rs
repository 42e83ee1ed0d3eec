use crate::{
    errors::ProviderError,
    indexer::{
        collect_ids, http_client, send_json, types::AlchemyOwnerResponse, MAX_CURSOR_PAGES,
    },
    Address, HoldingsQuerier, OwnedTokens,
};
use async_trait::async_trait;

pub const BASE_URL: &str = "https://eth-mainnet.g.alchemy.com/nft/v3";
const NFTS_FOR_OWNER: &str = "getNFTsForOwner";

/// Keyed provider; the key is part of the request path.
pub struct AlchemyProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlchemyProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl HoldingsQuerier for AlchemyProvider {
    fn name(&self) -> &'static str {
        "alchemy"
    }

    async fn owned_tokens(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError> {
        let mut ids = Vec::new();
        let mut page_key: Option<String> = None;

        for _ in 0..MAX_CURSOR_PAGES {
            let mut request = self
                .client
                .get(format!("{}/{}/{NFTS_FOR_OWNER}", self.base_url, self.api_key))
                .query(&[
                    ("owner", format!("{wallet:#x}")),
                    ("contractAddresses[]", format!("{contract:#x}")),
                    ("withMetadata", "false".to_string()),
                ]);
            if let Some(key) = &page_key {
                request = request.query(&[("pageKey", key)]);
            }

            let body: AlchemyOwnerResponse = send_json(request).await?;
            ids.extend(collect_ids(
                self.name(),
                body.owned_nfts
                    .iter()
                    .filter(|nft| nft.balance != Some(0))
                    .map(|nft| nft.token_id.as_str()),
            ));

            match body.page_key {
                Some(next) if !next.is_empty() => page_key = Some(next),
                _ => return Ok(OwnedTokens::complete(ids)),
            }
        }

        log::warn!("alchemy: stopped following page keys after {MAX_CURSOR_PAGES} pages");
        Ok(OwnedTokens { ids, complete: false })
    }
}
