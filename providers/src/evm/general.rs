use crate::{
    errors::ProviderError,
    evm::{abi, to_checksum},
    EthCaller, HoldingsQuerier, OwnedTokens, TokenId,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::{ops::RangeInclusive, sync::Arc};
use web3::{
    transports::Http,
    types::{Address, CallRequest},
    Web3,
};

/// JSON-RPC node used for `eth_call`.
pub struct RpcProvider {
    pub single: Web3<Http>,
}

impl RpcProvider {
    pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            single: Web3::new(Http::new(rpc_url)?),
        })
    }
}

#[async_trait]
impl EthCaller for RpcProvider {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let request = CallRequest {
            to: Some(to),
            data: Some(data.into()),
            ..Default::default()
        };

        Ok(self.single.eth().call(request, None).await?.0)
    }
}

/// Scans an ERC-1155 id range with one `balanceOfBatch` call per batch.
pub struct BatchBalanceClient {
    caller: Arc<dyn EthCaller>,
    ids: RangeInclusive<TokenId>,
    batch_size: usize,
    concurrency: usize,
}

impl BatchBalanceClient {
    pub fn new(
        caller: Arc<dyn EthCaller>,
        ids: RangeInclusive<TokenId>,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            caller,
            ids,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the ascending ids `wallet` holds. Batches that fail are logged
    /// and skipped, the result is then flagged incomplete; only a scan where
    /// every batch failed is an error.
    pub async fn scan(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError> {
        let ids: Vec<TokenId> = self.ids.clone().collect();
        if ids.is_empty() {
            return Ok(OwnedTokens::complete(Vec::new()));
        }

        let batches: Vec<Option<Vec<TokenId>>> = stream::iter(ids.chunks(self.batch_size).map(<[TokenId]>::to_vec))
            .map(|batch| async move {
                match self.scan_batch(wallet, contract, &batch).await {
                    Ok(owned) => Some(owned),
                    Err(e) => {
                        log::warn!(
                            "balanceOfBatch for {} ids {}..={} failed: {e}",
                            to_checksum(&wallet),
                            batch[0],
                            batch[batch.len() - 1],
                        );
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let total = batches.len();
        let succeeded: Vec<Vec<TokenId>> = batches.into_iter().flatten().collect();

        if succeeded.is_empty() {
            return Err(ProviderError::AllBatchesFailed);
        }

        let ok = succeeded.len();
        let complete = ok == total;
        let mut owned: Vec<TokenId> = succeeded.into_iter().flatten().collect();
        owned.sort_unstable();
        owned.dedup();

        log::debug!(
            "on-chain scan of {} found {} ids ({}/{} batches)",
            to_checksum(&wallet),
            owned.len(),
            ok,
            total,
        );

        Ok(OwnedTokens {
            ids: owned,
            complete,
        })
    }

    async fn scan_batch(
        &self,
        wallet: Address,
        contract: Address,
        batch: &[TokenId],
    ) -> Result<Vec<TokenId>, ProviderError> {
        let data = abi::encode_balance_of_batch(wallet, batch);
        let output = self.caller.call(contract, data).await?;
        let balances = abi::decode_balances(&output, batch.len())?;

        Ok(abi::owned_ids(batch, &balances))
    }
}

#[async_trait]
impl HoldingsQuerier for BatchBalanceClient {
    fn name(&self) -> &'static str {
        "onchain"
    }

    async fn owned_tokens(
        &self,
        wallet: Address,
        contract: Address,
    ) -> Result<OwnedTokens, ProviderError> {
        self.scan(wallet, contract).await
    }
}

#[cfg(test)]
mod test {
    use super::BatchBalanceClient;
    use crate::{address, errors::ProviderError, evm::abi, EthCaller, TokenId};
    use async_trait::async_trait;
    use std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };
    use web3::{
        ethabi::{self, ParamType, Token},
        types::{Address, U256},
    };

    /// Answers `balanceOfBatch` from a fixed set of owned ids. Batches whose
    /// first id is listed in `short_batches` get one balance too few.
    struct FakeNode {
        owned: HashSet<TokenId>,
        short_batches: HashSet<TokenId>,
        calls: AtomicUsize,
    }

    impl FakeNode {
        fn new(owned: &[TokenId], short_batches: &[TokenId]) -> Arc<Self> {
            Arc::new(Self {
                owned: owned.iter().copied().collect(),
                short_batches: short_batches.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EthCaller for FakeNode {
        async fn call(&self, _to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(&data[..4], &abi::BALANCE_OF_BATCH_SELECTOR);

            let args = ethabi::decode(
                &[
                    ParamType::Array(Box::new(ParamType::Address)),
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                ],
                &data[4..],
            )?;
            let ids: Vec<TokenId> = match &args[1] {
                Token::Array(items) => items
                    .iter()
                    .map(|t| t.clone().into_uint().unwrap().as_u32())
                    .collect(),
                _ => unreachable!(),
            };

            let mut balances: Vec<Token> = ids
                .iter()
                .map(|id| Token::Uint(U256::from(self.owned.contains(id) as u8)))
                .collect();
            if self.short_batches.contains(&ids[0]) {
                balances.pop();
            }

            Ok(ethabi::encode(&[Token::Array(balances)]))
        }
    }

    struct DeadNode;

    #[async_trait]
    impl EthCaller for DeadNode {
        async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::Status(502))
        }
    }

    const WALLET: &str = "0xe43878ce78934fe8007748ff481f03b8ee3b97de";
    const CONTRACT: &str = "0x33fd426905f149f8376e227d0c9d3340aad17af1";

    #[tokio::test]
    async fn one_call_per_batch() {
        let node = FakeNode::new(&[1, 50, 51, 404], &[]);
        let client = BatchBalanceClient::new(node.clone(), 1..=404, 50, 4);

        let owned = client
            .scan(address!(WALLET), address!(CONTRACT))
            .await
            .unwrap();

        assert_eq!(owned.ids, vec![1, 50, 51, 404]);
        assert!(owned.complete);
        assert_eq!(node.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn short_batch_is_dropped() {
        let node = FakeNode::new(&[3, 60, 140], &[1]);

        for concurrency in [1, 4] {
            let client = BatchBalanceClient::new(node.clone(), 1..=150, 50, concurrency);
            let owned = client
                .scan(address!(WALLET), address!(CONTRACT))
                .await
                .unwrap();

            assert_eq!(owned.ids, vec![60, 140]);
            assert!(!owned.complete);
        }
    }

    #[tokio::test]
    async fn every_batch_failing_is_an_error() {
        let client = BatchBalanceClient::new(Arc::new(DeadNode), 1..=404, 50, 2);

        let err = client
            .scan(address!(WALLET), address!(CONTRACT))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::AllBatchesFailed));
    }

    #[tokio::test]
    async fn uneven_last_batch() {
        let node = FakeNode::new(&[403], &[]);
        let client = BatchBalanceClient::new(node.clone(), 1..=403, 50, 3);

        let owned = client
            .scan(address!(WALLET), address!(CONTRACT))
            .await
            .unwrap();

        assert_eq!(owned.ids, vec![403]);
        assert_eq!(node.calls.load(Ordering::SeqCst), 9);
    }
}
