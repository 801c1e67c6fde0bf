pub mod http;
pub mod models;
#[cfg(test)]
pub mod stub;
pub mod traits;

pub use http::{HttpLedgerClient, HttpLedgerConfig};
pub use traits::LedgerGateway;
