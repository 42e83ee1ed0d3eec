pub mod aggregate;

pub use aggregate::{aggregate, TOP_TOKENS};
