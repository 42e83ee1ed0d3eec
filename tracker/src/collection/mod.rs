pub mod cache;
pub mod paginator;
pub mod query;
pub mod rules;
pub mod stats;

pub use cache::{merge, CacheEntry, MetadataCache};
pub use paginator::{walk, PaginatorConfig};
pub use query::{filter_by_season, search};
pub use rules::{FieldRules, Normalizer, Rule, BAD_IMAGE_MARKER, SEIZE_RULES};
