use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use memes_tracker::{
    collection::{filter_by_season, search},
    types::{AggregateHoldings, CollectionStats, Token, TokenId, WalletHoldings},
    TrackerError, TrackerService,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("Token #{0} is not in the current collection snapshot")]
    NotFound(TokenId),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Tracker(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionQuery {
    pub force_refresh: Option<bool>,
    pub season: Option<u32>,
    pub q: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct HoldingsRequest {
    pub wallets: Vec<String>,
}

/// A token with the fields derived from its id.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    #[serde(flatten)]
    pub token: Token,
    pub season: u32,
    pub card_number: TokenId,
}

impl TokenView {
    fn new(token: Token, season_size: u32) -> Self {
        Self {
            season: token.season(season_size),
            card_number: token.id,
            token,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub tokens: Vec<TokenView>,
    pub count: usize,
    pub complete: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsResponse {
    pub wallets: Vec<WalletHoldings>,
    pub aggregate: AggregateHoldings,
}

pub async fn collection(tracker: &TrackerService, query: CollectionQuery) -> CollectionResponse {
    let snapshot = tracker
        .fetch_collection(query.force_refresh.unwrap_or_default())
        .await;

    let tokens = match (&query.q, query.season) {
        (Some(q), Some(season)) => search(&snapshot, q)
            .into_iter()
            .filter(|token| snapshot.season_of(token) == season)
            .collect(),
        (Some(q), None) => search(&snapshot, q),
        (None, Some(season)) => filter_by_season(&snapshot, season),
        (None, None) => snapshot.tokens.clone(),
    };

    CollectionResponse {
        count: tokens.len(),
        tokens: tokens
            .into_iter()
            .map(|token| TokenView::new(token, snapshot.season_size))
            .collect(),
        complete: snapshot.complete,
        fetched_at: snapshot.fetched_at,
    }
}

pub async fn token(tracker: &TrackerService, id: TokenId) -> Result<TokenView, ApiError> {
    let token = tracker.fetch_token(id).await?.ok_or(ApiError::NotFound(id))?;

    Ok(TokenView::new(token, tracker.collection().season_size))
}

pub async fn stats(tracker: &TrackerService) -> CollectionStats {
    tracker.fetch_stats().await
}

pub async fn wallet(tracker: &TrackerService, address: &str) -> Result<WalletHoldings, ApiError> {
    Ok(tracker.resolve_wallet(address).await?)
}

pub async fn holdings(
    tracker: &TrackerService,
    wallets: &[String],
) -> Result<HoldingsResponse, ApiError> {
    let (wallets, snapshot) = futures::join!(
        tracker.resolve_wallets(wallets),
        tracker.fetch_collection(false)
    );
    let wallets = wallets?;
    let aggregate = tracker.aggregate_holdings(&wallets, &snapshot);

    Ok(HoldingsResponse { wallets, aggregate })
}

pub async fn clear_cache(tracker: &TrackerService) {
    tracker.clear_cache().await
}
