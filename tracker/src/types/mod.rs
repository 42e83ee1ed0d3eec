pub mod holdings;
pub mod token;

pub use holdings::*;
pub use providers::{Address, TokenId};
pub use token::*;
