use crate::{collection::PaginatorConfig, errors::ConfigError, types::Collection};
use providers::{
    address,
    indexer::{alchemy, ensideas, opensea, seize, simplehash},
    parse_address, Address,
};
use std::{path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_RPC: &str = "https://eth.llamarpc.com";
pub const MEMES_CONTRACT: &str = "0x33fd426905f149f8376e227d0c9d3340aad17af1";
pub const REVERSE_RESOLVER: &str = "0xa2c122be93b0074270ebee7f6b7292c7deb45047";

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub rpc_url: String,
    pub contract: Address,
    pub reverse_resolver: Address,
    pub seize_api_base: String,
    pub simplehash_api_base: String,
    pub simplehash_api_key: Option<String>,
    pub alchemy_api_base: String,
    pub alchemy_api_key: Option<String>,
    pub opensea_api_base: String,
    pub opensea_api_key: Option<String>,
    pub ensideas_api_base: String,
    pub collection: Collection,
    pub batch_size: usize,
    pub batch_concurrency: usize,
    pub paginator: PaginatorConfig,
    pub attempt_timeout: Duration,
    /// The full on-chain scan is many calls, so it gets a longer budget.
    pub onchain_timeout: Duration,
    pub metadata_ttl: Duration,
    pub metadata_cache_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC.to_string(),
            contract: address!(MEMES_CONTRACT),
            reverse_resolver: address!(REVERSE_RESOLVER),
            seize_api_base: seize::BASE_URL.to_string(),
            simplehash_api_base: simplehash::BASE_URL.to_string(),
            simplehash_api_key: None,
            alchemy_api_base: alchemy::BASE_URL.to_string(),
            alchemy_api_key: None,
            opensea_api_base: opensea::BASE_URL.to_string(),
            opensea_api_key: None,
            ensideas_api_base: ensideas::BASE_URL.to_string(),
            collection: Collection::default(),
            batch_size: 50,
            batch_concurrency: 4,
            paginator: PaginatorConfig::default(),
            attempt_timeout: Duration::from_secs(15),
            onchain_timeout: Duration::from_secs(30),
            metadata_ttl: WEEK,
            metadata_cache_path: None,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}

fn non_zero<T: PartialEq + Default>(var: &'static str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        Err(ConfigError::Zero(var))
    } else {
        Ok(value)
    }
}

macro_rules! env_or {
    ($lookup:expr, $var:expr, $default:expr) => {
        match $lookup($var) {
            Some(raw) => parse_var($var, raw)?,
            None => $default,
        }
    };
}

impl TrackerConfig {
    /// Reads the process environment; every variable is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // blank values count as unset
        let lookup = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let address_or = |var: &'static str, default: Address| -> Result<Address, ConfigError> {
            match lookup(var) {
                Some(raw) => Ok(parse_address(&raw)?),
                None => Ok(default),
            }
        };

        let secs = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            let secs: u64 = env_or!(lookup, var, default.as_secs());
            Ok(Duration::from_secs(non_zero(var, secs)?))
        };

        let collection = Collection {
            size: non_zero(
                "COLLECTION_SIZE",
                env_or!(lookup, "COLLECTION_SIZE", defaults.collection.size),
            )?,
            season_size: non_zero(
                "SEASON_SIZE",
                env_or!(lookup, "SEASON_SIZE", defaults.collection.season_size),
            )?,
        };

        let paginator = PaginatorConfig {
            page_size: non_zero(
                "PAGE_SIZE",
                env_or!(lookup, "PAGE_SIZE", defaults.paginator.page_size),
            )?,
            max_empty_pages: non_zero(
                "MAX_EMPTY_PAGES",
                env_or!(lookup, "MAX_EMPTY_PAGES", defaults.paginator.max_empty_pages),
            )?,
            max_pages: non_zero(
                "MAX_PAGES",
                env_or!(lookup, "MAX_PAGES", defaults.paginator.max_pages),
            )?,
            max_unique_tokens: non_zero(
                "MAX_UNIQUE_TOKENS",
                env_or!(lookup, "MAX_UNIQUE_TOKENS", defaults.paginator.max_unique_tokens),
            )?,
            page_timeout: secs("ATTEMPT_TIMEOUT_SECS", defaults.attempt_timeout)?,
        };

        Ok(Self {
            rpc_url: lookup("ETHEREUM_RPC").unwrap_or(defaults.rpc_url),
            contract: address_or("MEMES_CONTRACT", defaults.contract)?,
            reverse_resolver: address_or("REVERSE_RESOLVER", defaults.reverse_resolver)?,
            seize_api_base: lookup("SEIZE_API_BASE").unwrap_or(defaults.seize_api_base),
            simplehash_api_base: lookup("SIMPLEHASH_API_BASE")
                .unwrap_or(defaults.simplehash_api_base),
            simplehash_api_key: lookup("SIMPLEHASH_API_KEY"),
            alchemy_api_base: lookup("ALCHEMY_API_BASE").unwrap_or(defaults.alchemy_api_base),
            alchemy_api_key: lookup("ALCHEMY_API_KEY"),
            opensea_api_base: lookup("OPENSEA_API_BASE").unwrap_or(defaults.opensea_api_base),
            opensea_api_key: lookup("OPENSEA_API_KEY"),
            ensideas_api_base: lookup("ENSIDEAS_API_BASE").unwrap_or(defaults.ensideas_api_base),
            collection,
            batch_size: non_zero(
                "BATCH_SIZE",
                env_or!(lookup, "BATCH_SIZE", defaults.batch_size),
            )?,
            batch_concurrency: non_zero(
                "BATCH_CONCURRENCY",
                env_or!(lookup, "BATCH_CONCURRENCY", defaults.batch_concurrency),
            )?,
            paginator,
            attempt_timeout: secs("ATTEMPT_TIMEOUT_SECS", defaults.attempt_timeout)?,
            onchain_timeout: secs("ONCHAIN_TIMEOUT_SECS", defaults.onchain_timeout)?,
            metadata_ttl: secs("METADATA_TTL_SECS", defaults.metadata_ttl)?,
            metadata_cache_path: lookup("METADATA_CACHE_PATH").map(PathBuf::from),
        })
    }
}
