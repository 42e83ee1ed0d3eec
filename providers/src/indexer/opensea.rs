use crate::{
    errors::ProviderError,
    evm::parse_address,
    indexer::{
        collect_ids, http_client, send_json, types::OpenSeaAccountResponse, MAX_CURSOR_PAGES,
    },
    Address, HoldingsQuerier, OwnedTokens,
};
use async_trait::async_trait;

pub const BASE_URL: &str = "https://api.opensea.io/api/v2";
pub const COLLECTION_SLUG: &str = "the-memes-by-6529";

pub struct OpenSeaProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    collection: String,
}

impl OpenSeaProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl HoldingsQuerier for OpenSeaProvider {
    fn name(&self) -> &'static str {
        "opensea"
    }

    async fn owned_tokens(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError> {
        let mut ids = Vec::new();
        let mut next: Option<String> = None;

        for _ in 0..MAX_CURSOR_PAGES {
            let mut request = self
                .client
                .get(format!(
                    "{}/chain/ethereum/account/{wallet:#x}/nfts",
                    self.base_url
                ))
                .header("X-API-KEY", &self.api_key)
                .query(&[("collection", self.collection.as_str()), ("limit", "200")]);
            if let Some(next) = &next {
                request = request.query(&[("next", next)]);
            }

            let body: OpenSeaAccountResponse = send_json(request).await?;
            ids.extend(collect_ids(
                self.name(),
                body.nfts
                    .iter()
                    // a collection slug can span several contracts
                    .filter(|nft| match &nft.contract {
                        Some(c) => parse_address(c).map_or(false, |c| c == contract),
                        None => true,
                    })
                    .map(|nft| nft.identifier.as_str()),
            ));

            match body.next {
                Some(cursor) if !cursor.is_empty() => next = Some(cursor),
                _ => return Ok(OwnedTokens::complete(ids)),
            }
        }

        log::warn!("opensea: stopped following cursors after {MAX_CURSOR_PAGES} pages");
        Ok(OwnedTokens { ids, complete: false })
    }
}

#[cfg(test)]
mod test {
    use super::{OpenSeaProvider, COLLECTION_SLUG};
    use crate::{address, HoldingsQuerier};
    use mockito::Matcher;

    #[tokio::test]
    async fn opensea_filters_foreign_contracts() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                "/chain/ethereum/account/0xe43878ce78934fe8007748ff481f03b8ee3b97de/nfts",
            )
            .match_header("x-api-key", "key")
            .match_query(Matcher::UrlEncoded("collection".into(), COLLECTION_SLUG.into()))
            .with_status(200)
            .with_body(
                r#"{"nfts": [
                    {"identifier": "1", "contract": "0x33fd426905f149f8376e227d0c9d3340aad17af1"},
                    {"identifier": "2", "contract": "0x0000000000000000000000000000000000000001"},
                    {"identifier": "3"}
                ]}"#,
            )
            .create_async()
            .await;

        let provider = OpenSeaProvider::new(server.url(), "key", COLLECTION_SLUG);
        let owned = provider
            .owned_tokens(
                address!("0xe43878ce78934fe8007748ff481f03b8ee3b97de"),
                address!("0x33fd426905f149f8376e227d0c9d3340aad17af1"),
            )
            .await
            .unwrap();

        assert_eq!(owned.ids, vec![1, 3]);
    }
}
