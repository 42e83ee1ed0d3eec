use crate::{
    collection::{walk, MetadataCache, Normalizer},
    config::TrackerConfig,
    errors::{ConfigError, TrackerError},
    fallback::{FallbackChain, Resolved},
    holdings::aggregate,
    types::{
        AggregateHoldings, Collection, CollectionSnapshot, CollectionStats, Token, TokenId,
        WalletHoldings,
    },
};
use chrono::Utc;
use providers::{
    indexer::{
        opensea, AlchemyProvider, EnsIdeasProvider, OpenSeaProvider, SeizeProvider,
        SimpleHashProvider,
    },
    parse_address, Address, BatchBalanceClient, CollectionLister, EthCaller, HoldingsQuerier,
    NameResolver, ProviderError, ReverseNameResolver, RpcProvider, StatsProvider,
};
use std::{sync::Arc, time::Duration};

/// A holdings source together with the time it is allowed to take.
pub struct HoldingsSource {
    pub querier: Arc<dyn HoldingsQuerier>,
    pub timeout: Duration,
}

/// Every external data source the service talks to. Holdings sources and
/// name resolvers are tried in vector order.
pub struct Providers {
    pub lister: Arc<dyn CollectionLister>,
    pub stats: Arc<dyn StatsProvider>,
    pub holdings: Vec<HoldingsSource>,
    pub names: Vec<Arc<dyn NameResolver>>,
}

impl Providers {
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let rpc: Arc<dyn EthCaller> = Arc::new(RpcProvider::new(&config.rpc_url)?);
        let seize = Arc::new(SeizeProvider::new(config.seize_api_base.clone()));

        let mut holdings = vec![
            HoldingsSource {
                querier: Arc::new(BatchBalanceClient::new(
                    rpc.clone(),
                    config.collection.ids(),
                    config.batch_size,
                    config.batch_concurrency,
                )),
                timeout: config.onchain_timeout,
            },
            HoldingsSource {
                querier: Arc::new(SimpleHashProvider::new(
                    config.simplehash_api_base.clone(),
                    config.simplehash_api_key.clone(),
                )),
                timeout: config.attempt_timeout,
            },
        ];

        if let Some(key) = &config.alchemy_api_key {
            holdings.push(HoldingsSource {
                querier: Arc::new(AlchemyProvider::new(config.alchemy_api_base.clone(), key)),
                timeout: config.attempt_timeout,
            });
        }

        if let Some(key) = &config.opensea_api_key {
            holdings.push(HoldingsSource {
                querier: Arc::new(OpenSeaProvider::new(
                    config.opensea_api_base.clone(),
                    key,
                    opensea::COLLECTION_SLUG,
                )),
                timeout: config.attempt_timeout,
            });
        }

        log::info!(
            "holdings sources: {}",
            holdings
                .iter()
                .map(|source| source.querier.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let reverse: Arc<dyn NameResolver> =
            Arc::new(ReverseNameResolver::new(rpc, config.reverse_resolver));
        let ensideas: Arc<dyn NameResolver> =
            Arc::new(EnsIdeasProvider::new(config.ensideas_api_base.clone()));

        Ok(Self {
            lister: seize.clone(),
            stats: seize,
            holdings,
            names: vec![reverse, ensideas],
        })
    }
}

pub struct TrackerService {
    config: TrackerConfig,
    providers: Providers,
    normalizer: Normalizer,
    cache: MetadataCache,
}

impl TrackerService {
    pub async fn new(config: TrackerConfig, providers: Providers) -> Self {
        let cache = MetadataCache::load(config.metadata_cache_path.clone()).await;

        Self {
            config,
            providers,
            normalizer: Normalizer::default(),
            cache,
        }
    }

    pub async fn from_config(config: TrackerConfig) -> Result<Self, ConfigError> {
        let providers = Providers::from_config(&config)?;

        Ok(Self::new(config, providers).await)
    }

    pub fn collection(&self) -> &Collection {
        &self.config.collection
    }

    /// Walks the listing endpoint and merges the result with the metadata
    /// cache. `force_refresh` serves the fresh identities as they are but
    /// still replaces the cache entry.
    pub async fn fetch_collection(&self, force_refresh: bool) -> CollectionSnapshot {
        let fresh = walk(
            self.providers.lister.as_ref(),
            self.config.contract,
            &self.config.collection,
            &self.normalizer,
            &self.config.paginator,
        )
        .await;

        self.cache
            .merge_and_store(fresh, self.config.metadata_ttl, force_refresh)
            .await
    }

    /// Looks up a single token in a freshly fetched collection.
    pub async fn fetch_token(&self, id: TokenId) -> Result<Option<Token>, TrackerError> {
        self.config.collection.check_id(id)?;

        Ok(self.fetch_collection(false).await.get(id).cloned())
    }

    pub async fn fetch_stats(&self) -> CollectionStats {
        let request = self.providers.stats.collection_stats(self.config.contract);

        match tokio::time::timeout(self.config.attempt_timeout, request).await {
            Ok(Ok(raw)) => CollectionStats::from_raw(raw, &self.config.collection),
            Ok(Err(e)) => {
                log::warn!("collection stats failed: {e}");
                CollectionStats::fallback(&self.config.collection)
            }
            Err(_) => {
                log::warn!("collection stats timed out");
                CollectionStats::fallback(&self.config.collection)
            }
        }
    }

    /// Provider failures never surface here: a wallet nobody could answer for
    /// comes back empty with no `source`.
    pub async fn resolve_wallet(&self, address: &str) -> Result<WalletHoldings, TrackerError> {
        let wallet = parse_wallet(address)?;

        Ok(self.resolve(wallet).await)
    }

    /// Validates every address before touching the network, then resolves the
    /// wallets concurrently. Output order follows input order.
    pub async fn resolve_wallets<S: AsRef<str>>(
        &self,
        addresses: &[S],
    ) -> Result<Vec<WalletHoldings>, TrackerError> {
        let wallets = addresses
            .iter()
            .map(|address| parse_wallet(address.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let resolved = wallets.into_iter().map(|wallet| self.resolve(wallet));

        Ok(futures::future::join_all(resolved).await)
    }

    pub fn aggregate_holdings(
        &self,
        wallets: &[WalletHoldings],
        snapshot: &CollectionSnapshot,
    ) -> AggregateHoldings {
        aggregate(wallets, snapshot)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        log::info!("metadata cache cleared");
    }

    async fn resolve(&self, wallet: Address) -> WalletHoldings {
        let contract = self.config.contract;

        let mut holdings = FallbackChain::new("holdings", self.config.attempt_timeout);
        for source in &self.providers.holdings {
            let querier = &source.querier;
            holdings = holdings.attempt_with_timeout(
                querier.name(),
                source.timeout,
                move || async move { querier.owned_tokens(wallet, contract).await },
            );
        }

        let mut names = FallbackChain::new("name", self.config.attempt_timeout);
        for resolver in &self.providers.names {
            names = names.attempt(resolver.name(), move || async move {
                resolver
                    .resolve_name(wallet)
                    .await?
                    .ok_or(ProviderError::NotFound)
            });
        }

        let (holdings, name) = futures::join!(holdings.run(), names.run());

        let (source, ids, complete) = match holdings {
            Some(Resolved { source, value }) => {
                (Some(source.to_string()), value.ids, value.complete)
            }
            None => (None, Vec::new(), false),
        };

        let collection = &self.config.collection;
        let owned_token_ids = ids
            .into_iter()
            .filter(|id| {
                let in_range = collection.contains(*id);
                if !in_range {
                    log::debug!("dropping out of range id {id}");
                }
                in_range
            })
            .collect();

        WalletHoldings {
            address: wallet,
            display_name: name.map(|resolved| resolved.value),
            owned_token_ids,
            last_checked: Utc::now(),
            source,
            complete,
        }
    }
}

fn parse_wallet(address: &str) -> Result<Address, TrackerError> {
    parse_address(address).map_err(|_| TrackerError::InvalidAddress(address.to_string()))
}

#[cfg(test)]
mod test {
    use super::{HoldingsSource, Providers, TrackerService};
    use crate::{
        collection::paginator::test::{page, record, ScriptedLister},
        config::TrackerConfig,
        errors::TrackerError,
    };
    use async_trait::async_trait;
    use providers::{
        Address, HoldingsQuerier, NameResolver, OwnedTokens, ProviderError, RawCollectionStats,
        StatsProvider, TokenId,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    const W1: &str = "0xe43878ce78934fe8007748ff481f03b8ee3b97de";
    const W2: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";

    struct FakeHoldings {
        name: &'static str,
        ids: Option<Vec<TokenId>>,
        calls: AtomicUsize,
    }

    impl FakeHoldings {
        fn new(name: &'static str, ids: Option<Vec<TokenId>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                ids,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HoldingsQuerier for FakeHoldings {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn owned_tokens(
            &self,
            _wallet: Address,
            _contract: Address,
        ) -> Result<OwnedTokens, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ids
                .clone()
                .map(OwnedTokens::complete)
                .ok_or(ProviderError::Status(503))
        }
    }

    struct FakeNames(&'static str, Option<&'static str>);

    #[async_trait]
    impl NameResolver for FakeNames {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn resolve_name(&self, _wallet: Address) -> Result<Option<String>, ProviderError> {
            Ok(self.1.map(str::to_string))
        }
    }

    struct FakeStats(Option<RawCollectionStats>);

    #[async_trait]
    impl StatsProvider for FakeStats {
        async fn collection_stats(
            &self,
            _contract: Address,
        ) -> Result<RawCollectionStats, ProviderError> {
            self.0.clone().ok_or(ProviderError::Status(500))
        }
    }

    async fn service(
        lister: ScriptedLister,
        holdings: Vec<Arc<FakeHoldings>>,
        names: Vec<FakeNames>,
    ) -> TrackerService {
        let providers = Providers {
            lister: Arc::new(lister),
            stats: Arc::new(FakeStats(None)),
            holdings: holdings
                .into_iter()
                .map(|querier| HoldingsSource {
                    querier,
                    timeout: Duration::from_secs(1),
                })
                .collect(),
            names: names
                .into_iter()
                .map(|n| Arc::new(n) as Arc<dyn NameResolver>)
                .collect(),
        };

        TrackerService::new(TrackerConfig::default(), providers).await
    }

    #[tokio::test]
    async fn falls_back_and_filters_range() {
        let onchain = FakeHoldings::new("onchain", None);
        let simplehash = FakeHoldings::new("simplehash", Some(vec![3, 1, 405]));
        let alchemy = FakeHoldings::new("alchemy", Some(vec![9]));
        let service = service(
            ScriptedLister::new(vec![]),
            vec![onchain.clone(), simplehash.clone(), alchemy.clone()],
            vec![],
        )
        .await;

        let wallet = service.resolve_wallet(W1).await.unwrap();

        assert_eq!(wallet.source.as_deref(), Some("simplehash"));
        assert_eq!(
            wallet.owned_token_ids.iter().copied().collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(wallet.total_owned(), 2);
        assert!(wallet.complete);
        assert_eq!(onchain.calls.load(Ordering::SeqCst), 1);
        assert_eq!(alchemy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn every_source_failing_is_empty() {
        let service = service(
            ScriptedLister::new(vec![]),
            vec![FakeHoldings::new("onchain", None)],
            vec![],
        )
        .await;

        let wallet = service.resolve_wallet(W1).await.unwrap();

        assert!(wallet.owned_token_ids.is_empty());
        assert!(wallet.source.is_none());
        assert!(!wallet.complete);
        assert!(wallet.display_name.is_none());
    }

    #[tokio::test]
    async fn name_falls_through_missing_record() {
        let service = service(
            ScriptedLister::new(vec![]),
            vec![FakeHoldings::new("onchain", Some(vec![1]))],
            vec![
                FakeNames("reverse-record", None),
                FakeNames("ensideas", Some("collector.eth")),
            ],
        )
        .await;

        let wallet = service.resolve_wallet(W1).await.unwrap();

        assert_eq!(wallet.display_name.as_deref(), Some("collector.eth"));
    }

    #[tokio::test]
    async fn invalid_addresses_fail_before_any_lookup() {
        let onchain = FakeHoldings::new("onchain", Some(vec![1]));
        let service = service(ScriptedLister::new(vec![]), vec![onchain.clone()], vec![]).await;

        assert_eq!(
            service.resolve_wallet("0x123").await.unwrap_err(),
            TrackerError::InvalidAddress("0x123".to_string())
        );
        assert_eq!(
            service
                .resolve_wallets(&[W1, "not-an-address"])
                .await
                .unwrap_err(),
            TrackerError::InvalidAddress("not-an-address".to_string())
        );
        assert_eq!(onchain.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wallets_keep_input_order() {
        let service = service(
            ScriptedLister::new(vec![]),
            vec![FakeHoldings::new("onchain", Some(vec![1, 2]))],
            vec![],
        )
        .await;

        let wallets = service.resolve_wallets(&[W2, W1]).await.unwrap();

        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0].address, providers::address!(W2));
        assert_eq!(wallets[1].address, providers::address!(W1));
    }

    #[tokio::test]
    async fn collection_identities_come_from_cache() {
        let service = service(
            ScriptedLister::new(vec![
                page(vec![record(1, "original", 0.1)], false),
                page(vec![record(1, "renamed", 0.2)], false),
                page(vec![record(1, "renamed", 0.3)], false),
            ]),
            vec![],
            vec![],
        )
        .await;

        let first = service.fetch_collection(false).await;
        assert_eq!(first.get(1).unwrap().identity.name, "original");

        let second = service.fetch_collection(false).await;
        assert_eq!(second.get(1).unwrap().identity.name, "original");
        assert_eq!(second.get(1).unwrap().market.floor_price, 0.2);

        service.clear_cache().await;
        let third = service.fetch_collection(false).await;
        assert_eq!(third.get(1).unwrap().identity.name, "renamed");
        assert_eq!(third.get(1).unwrap().market.floor_price, 0.3);
    }

    #[tokio::test]
    async fn token_lookup() {
        let service = service(
            ScriptedLister::new(vec![page(vec![record(5, "five", 0.1)], false)]),
            vec![],
            vec![],
        )
        .await;

        assert_eq!(
            service.fetch_token(0).await.unwrap_err(),
            TrackerError::TokenOutOfRange(0)
        );
        let token = service.fetch_token(5).await.unwrap().unwrap();
        assert_eq!(token.identity.name, "five");
    }

    #[tokio::test]
    async fn stats_fall_back_to_defaults() {
        let service = service(ScriptedLister::new(vec![]), vec![], vec![]).await;

        let stats = service.fetch_stats().await;

        assert_eq!(stats.total_tokens, 404);
        assert_eq!(stats.total_collectors, 12_000);
        assert_eq!(stats.floor_price, 0.08);
    }

    #[tokio::test]
    async fn aggregate_across_resolved_wallets() {
        let service = service(
            ScriptedLister::new(vec![page(
                (1..=10).map(|id| record(id, "x", 0.1)).collect(),
                false,
            )]),
            vec![FakeHoldings::new("onchain", Some(vec![2, 4]))],
            vec![],
        )
        .await;

        let wallets = service.resolve_wallets(&[W1, W2]).await.unwrap();
        let snapshot = service.fetch_collection(false).await;
        let result = service.aggregate_holdings(&wallets, &snapshot);

        assert_eq!(result.owned_count, 2);
        assert_eq!(result.missing_count, 8);
        assert_eq!(result.duplicate_count, 2);
        assert_eq!(result.completion, 20.0);
    }
}
