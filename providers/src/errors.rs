use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid address `{0}`")]
    InvalidAddress(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Web3(#[from] web3::Error),
    #[error(transparent)]
    Abi(#[from] web3::ethabi::Error),
    #[error("Provider responded with status `{0}`")]
    Status(u16),
    #[error("Too many requests")]
    TooManyRequests,
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Nothing found")]
    NotFound,
    #[error("Every batch of the balance scan failed")]
    AllBatchesFailed,
}

impl ProviderError {
    /// Caller mistakes, as opposed to provider trouble that a fallback can absorb.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ProviderError::InvalidAddress(_))
    }
}
