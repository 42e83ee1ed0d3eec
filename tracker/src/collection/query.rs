use crate::types::{CollectionSnapshot, Token};

pub fn filter_by_season(snapshot: &CollectionSnapshot, season: u32) -> Vec<Token> {
    snapshot
        .tokens
        .iter()
        .filter(|token| snapshot.season_of(token) == season)
        .cloned()
        .collect()
}

/// Case-insensitive substring match on name and artist. A blank query
/// matches nothing.
pub fn search(snapshot: &CollectionSnapshot, query: &str) -> Vec<Token> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    snapshot
        .tokens
        .iter()
        .filter(|token| {
            token.identity.name.to_lowercase().contains(&query)
                || token.identity.artist.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}
