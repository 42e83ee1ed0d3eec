use crate::{
    errors::ProviderError,
    evm::{abi, lower_hex},
    EthCaller, NameResolver,
};
use async_trait::async_trait;
use std::sync::Arc;
use web3::{signing::keccak256, types::Address};

lazy_static::lazy_static! {
    static ref ADDR_REVERSE_NODE: [u8; 32] = namehash("addr.reverse");
}

pub fn namehash(name: &str) -> [u8; 32] {
    name.rsplit('.')
        .filter(|label| !label.is_empty())
        .fold([0u8; 32], |node, label| child_node(node, label))
}

fn child_node(parent: [u8; 32], label: &str) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&parent);
    buf[32..].copy_from_slice(&keccak256(label.as_bytes()));

    keccak256(&buf)
}

/// `namehash("<addr>.addr.reverse")`
pub fn reverse_node(address: &Address) -> [u8; 32] {
    child_node(*ADDR_REVERSE_NODE, &lower_hex(address))
}

/// Reads the primary name of an address from its reverse record.
pub struct ReverseNameResolver {
    caller: Arc<dyn EthCaller>,
    resolver: Address,
}

impl ReverseNameResolver {
    pub fn new(caller: Arc<dyn EthCaller>, resolver: Address) -> Self {
        Self { caller, resolver }
    }
}

#[async_trait]
impl NameResolver for ReverseNameResolver {
    fn name(&self) -> &'static str {
        "reverse-record"
    }

    async fn resolve_name(&self, wallet: Address) -> Result<Option<String>, ProviderError> {
        let data = abi::encode_name(reverse_node(&wallet));
        let output = self.caller.call(self.resolver, data).await?;

        abi::decode_name(&output)
    }
}
