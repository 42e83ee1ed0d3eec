//! HTTP clients for the indexer-style providers: the Seize collection
//! listing, wallet holdings indexers and an HTTP name lookup.

pub mod alchemy;
pub mod ensideas;
pub mod opensea;
pub mod seize;
pub mod simplehash;
pub mod types;

pub use alchemy::AlchemyProvider;
pub use ensideas::EnsIdeasProvider;
pub use opensea::OpenSeaProvider;
pub use seize::SeizeProvider;
pub use simplehash::SimpleHashProvider;

use crate::{errors::ProviderError, TokenId};
use reqwest::{header::ACCEPT, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Cursor-paginated holdings endpoints stop following cursors after this many pages.
const MAX_CURSOR_PAGES: usize = 10;

const USER_AGENT: &str = concat!("memes-tracker/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let res = request.header(ACCEPT, "application/json").send().await?;
    let status = res.status();

    match status {
        StatusCode::OK => Ok(res.json::<T>().await?),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::TooManyRequests),
        _ => Err(ProviderError::Status(status.as_u16())),
    }
}

/// Token ids arrive as decimal strings or, from some endpoints, `0x` hex.
pub fn parse_token_id(raw: &str) -> Option<TokenId> {
    let raw = raw.trim();

    match raw.strip_prefix("0x") {
        Some(hex) => TokenId::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn collect_ids<'a>(provider: &str, raw: impl Iterator<Item = &'a str>) -> Vec<TokenId> {
    raw.filter_map(|id| {
        let parsed = parse_token_id(id);
        if parsed.is_none() {
            log::debug!("{provider}: skipping unparsable token id `{id}`");
        }
        parsed
    })
    .collect()
}
