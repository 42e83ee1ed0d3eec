use crate::{
    errors::ProviderError,
    indexer::{
        collect_ids, http_client, send_json, types::SimpleHashOwnersResponse, MAX_CURSOR_PAGES,
    },
    Address, HoldingsQuerier, OwnedTokens,
};
use async_trait::async_trait;

pub const BASE_URL: &str = "https://api.simplehash.com/api/v0";
const NFTS_BY_OWNER: &str = "nfts/owners";

pub struct SimpleHashProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SimpleHashProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl HoldingsQuerier for SimpleHashProvider {
    fn name(&self) -> &'static str {
        "simplehash"
    }

    async fn owned_tokens(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_CURSOR_PAGES {
            let mut request = self
                .client
                .get(format!("{}/{NFTS_BY_OWNER}", self.base_url))
                .query(&[
                    ("chains", "ethereum".to_string()),
                    ("wallet_addresses", format!("{wallet:#x}")),
                    ("contract_addresses", format!("{contract:#x}")),
                    ("limit", "50".to_string()),
                ]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }
            if let Some(key) = &self.api_key {
                request = request.header("X-API-KEY", key);
            }

            let body: SimpleHashOwnersResponse = send_json(request).await?;
            ids.extend(collect_ids(
                self.name(),
                body.nfts
                    .iter()
                    .filter_map(|nft| nft.token_id.as_deref().or(nft.nft_id.as_deref())),
            ));

            match body.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(OwnedTokens::complete(ids)),
            }
        }

        log::warn!("simplehash: stopped following cursors after {MAX_CURSOR_PAGES} pages");
        Ok(OwnedTokens { ids, complete: false })
    }
}
