use serde::{Deserialize, Deserializer};
use serde_aux::prelude::*;
use serde_json::Value;

/// Keeps `null` distinguishable from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Debug)]
pub struct SeizePage {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, deserialize_with = "present")]
    pub next: Option<Value>,
}

impl SeizePage {
    /// Whether the endpoint says another page follows. Without a `next`
    /// field the walk keeps going and relies on its own stop conditions.
    pub fn has_more(&self) -> bool {
        match &self.next {
            None => true,
            Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct SeizeStats {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub total_supply: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub num_owners: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub unique_owners: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub total_volume: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub volume_all_time: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub floor_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub market_cap: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct SimpleHashNft {
    pub token_id: Option<String>,
    pub nft_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SimpleHashOwnersResponse {
    #[serde(default)]
    pub nfts: Vec<SimpleHashNft>,
    pub next_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AlchemyNft {
    pub token_id: String,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub balance: Option<u64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AlchemyOwnerResponse {
    #[serde(default)]
    pub owned_nfts: Vec<AlchemyNft>,
    pub page_key: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OpenSeaNft {
    pub identifier: String,
    pub contract: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OpenSeaAccountResponse {
    #[serde(default)]
    pub nfts: Vec<OpenSeaNft>,
    pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct EnsIdeasResponse {
    pub name: Option<String>,
}
