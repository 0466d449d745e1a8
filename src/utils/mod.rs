pub mod address;
pub mod ens;

pub use address::{is_ens_name, parse_address};
pub use ens::{EnsResolver, NameResolver};
