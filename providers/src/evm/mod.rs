pub mod abi;
pub mod ens;
pub mod general;

pub use ens::ReverseNameResolver;
pub use general::{BatchBalanceClient, RpcProvider};

use crate::errors::ProviderError;
use std::str::FromStr;
use web3::{signing::keccak256, types::Address};

/// Parses a `0x`-prefixed hex address. Mixed-case input has to carry a valid
/// EIP-55 checksum, all-lowercase and all-uppercase input is accepted as is.
pub fn parse_address(input: &str) -> Result<Address, ProviderError> {
    let invalid = || ProviderError::InvalidAddress(input.to_string());
    let trimmed = input.trim();

    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(invalid)?;

    if hex.len() != 40 {
        return Err(invalid());
    }

    let address = Address::from_str(hex).map_err(|_| invalid())?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksum_hex(hex) != hex {
        return Err(invalid());
    }

    Ok(address)
}

/// EIP-55 representation of `address`, `0x` prefixed.
pub fn to_checksum(address: &Address) -> String {
    format!("0x{}", checksum_hex(&lower_hex(address)))
}

pub(crate) fn lower_hex(address: &Address) -> String {
    format!("{address:x}")
}

fn checksum_hex(hex: &str) -> String {
    let lower = hex.to_ascii_lowercase();
    let hash = keccak256(lower.as_bytes());

    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };

            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

#[macro_export]
macro_rules! address {
    ($addr:expr) => {{
        $crate::evm::parse_address($addr).expect(&format!("Invalid address {}", $addr))
    }};
}

#[cfg(test)]
mod test {
    use super::{lower_hex, parse_address, to_checksum};

    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn accepts_valid_checksums() {
        for addr in CHECKSUMMED {
            let parsed = parse_address(addr).unwrap();
            assert_eq!(to_checksum(&parsed), addr);
        }
    }

    #[test]
    fn accepts_single_case() {
        let lower = parse_address("0x33fd426905f149f8376e227d0c9d3340aad17af1").unwrap();
        let upper = parse_address("0x33FD426905F149F8376E227D0C9D3340AAD17AF1").unwrap();

        assert_eq!(lower, upper);
    }

    #[test]
    fn lowercase_hex_is_full_width() {
        let addr = parse_address("0x00000000000000000000000000000000000000aB").unwrap();

        assert_eq!(lower_hex(&addr), "00000000000000000000000000000000000000ab");
        assert_eq!(lower_hex(&addr).len(), 40);
    }

    #[test]
    fn rejects_bad_checksum() {
        assert!(parse_address("0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }

    #[test]
    fn rejects_malformed() {
        for addr in [
            "",
            "0x",
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAe",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAedd",
            "0xzzzeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "vitalik.eth",
        ] {
            let err = parse_address(addr).unwrap_err();
            assert!(err.is_invalid_input());
        }
    }
}
