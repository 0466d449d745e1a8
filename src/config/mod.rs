pub mod rpc;
pub mod settings;

pub use rpc::RpcSettings;
pub use settings::{
    AppSettings, ProviderSettings, RetrySettings, ScoringSettings, Settings, UnknownAddressPolicy,
};
