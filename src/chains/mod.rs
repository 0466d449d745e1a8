pub mod classifier;
pub mod client;
pub mod covalent;
pub mod resilience;

pub use classifier::{CodeReader, EthersCodeReader, RpcClassifier};
pub use client::DataProvider;
pub use covalent::CovalentClient;
pub use resilience::RetryPolicy;
