use crate::{
    errors::ProviderError,
    indexer::{http_client, send_json, types::EnsIdeasResponse},
    Address, NameResolver,
};
use async_trait::async_trait;

pub const BASE_URL: &str = "https://api.ensideas.com";

pub struct EnsIdeasProvider {
    client: reqwest::Client,
    base_url: String,
}

impl EnsIdeasProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl NameResolver for EnsIdeasProvider {
    fn name(&self) -> &'static str {
        "ensideas"
    }

    async fn resolve_name(&self, wallet: Address) -> Result<Option<String>, ProviderError> {
        let body: EnsIdeasResponse = send_json(
            self.client
                .get(format!("{}/ens/resolve/{wallet:#x}", self.base_url)),
        )
        .await?;

        Ok(body.name.filter(|name| !name.is_empty()))
    }
}

#[cfg(test)]
mod test {
    use super::EnsIdeasProvider;
    use crate::{address, NameResolver};

    #[tokio::test]
    async fn ensideas_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                "/ens/resolve/0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
            )
            .with_status(200)
            .with_body(r#"{"address": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045", "name": "vitalik.eth", "displayName": "vitalik.eth"}"#)
            .create_async()
            .await;

        let provider = EnsIdeasProvider::new(server.url());
        let name = provider
            .resolve_name(address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"))
            .await
            .unwrap();

        assert_eq!(name.as_deref(), Some("vitalik.eth"));
    }
}
