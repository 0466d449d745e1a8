pub mod chain_data;
pub mod error;
pub mod score;

pub use chain_data::*;
pub use error::*;
pub use score::*;
