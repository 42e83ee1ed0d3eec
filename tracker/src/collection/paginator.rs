use crate::{
    collection::rules::Normalizer,
    types::{Collection, CollectionSnapshot, Token},
};
use chrono::Utc;
use providers::{Address, CollectionLister, TokenId};
use std::{collections::BTreeMap, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    pub page_size: u32,
    /// Consecutive pages without a usable record that end the walk.
    pub max_empty_pages: u32,
    /// Hard ceiling on requested pages.
    pub max_pages: u32,
    /// Unique ids after which the walk stops; collection size plus slack.
    pub max_unique_tokens: usize,
    pub page_timeout: Duration,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_empty_pages: 3,
            max_pages: 20,
            max_unique_tokens: 500,
            page_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Cap,
    EmptyPages,
    Exhausted,
    PageCeiling,
    Failed,
}

impl Stop {
    fn is_complete(self) -> bool {
        matches!(self, Stop::Cap | Stop::EmptyPages | Stop::Exhausted)
    }
}

/// Walks the listing endpoint page by page (1-based) and returns every usable
/// token, deduplicated by id with the last record seen winning. A failed page
/// ends the walk and what was gathered so far is returned, flagged incomplete.
pub async fn walk(
    lister: &dyn CollectionLister,
    contract: Address,
    collection: &Collection,
    normalizer: &Normalizer,
    config: &PaginatorConfig,
) -> CollectionSnapshot {
    let mut tokens: BTreeMap<TokenId, Token> = BTreeMap::new();
    let mut empty_pages = 0;
    let mut page = 1;

    let stop = loop {
        if tokens.len() >= config.max_unique_tokens {
            break Stop::Cap;
        }
        if empty_pages >= config.max_empty_pages {
            break Stop::EmptyPages;
        }
        if page > config.max_pages {
            break Stop::PageCeiling;
        }

        let listing = match tokio::time::timeout(
            config.page_timeout,
            lister.list_page(contract, page, config.page_size),
        )
        .await
        {
            Ok(Ok(listing)) => listing,
            Ok(Err(e)) => {
                log::warn!("collection page {page} failed: {e}");
                break Stop::Failed;
            }
            Err(_) => {
                log::warn!("collection page {page} timed out");
                break Stop::Failed;
            }
        };

        let usable: Vec<Token> = listing
            .records
            .iter()
            .filter_map(|record| normalizer.normalize(record))
            .filter(|token| collection.contains(token.id))
            .collect();

        log::debug!(
            "collection page {page}: {} records, {} usable",
            listing.records.len(),
            usable.len()
        );

        if usable.is_empty() {
            empty_pages += 1;
        } else {
            empty_pages = 0;
            for token in usable {
                tokens.insert(token.id, token);
            }
        }

        if !listing.has_more {
            break Stop::Exhausted;
        }

        page += 1;
    };

    log::info!(
        "collection walk stopped ({stop:?}) after page {page} with {} tokens",
        tokens.len()
    );

    CollectionSnapshot {
        tokens: tokens.into_values().collect(),
        season_size: collection.season_size,
        fetched_at: Utc::now(),
        complete: stop.is_complete(),
    }
}
