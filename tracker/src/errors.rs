use thiserror::Error;

/// Caller mistakes; provider trouble never surfaces as an error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Invalid address `{0}`")]
    InvalidAddress(String),
    #[error("Token id `{0}` is outside the collection")]
    TokenOutOfRange(u32),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable `{var}` has invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
    #[error("Environment variable `{0}` must be greater than zero")]
    Zero(&'static str),
    #[error(transparent)]
    Provider(#[from] providers::ProviderError),
}
